use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftList {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftItem {
    pub id: Uuid,
    pub gift_list_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Reference price in whole yen; purely informational.
    pub target_amount: Option<i64>,
    pub product_url: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateGiftListRequest {
    pub couple_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl CreateGiftListRequest {
    /// Title/description used when the couple has not written their own yet.
    pub fn default_title() -> &'static str {
        "新生活スタート応援リスト"
    }

    pub fn default_description() -> &'static str {
        "新生活で必要なものをまとめたご祝儀リストです。"
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateGiftListRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGiftItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub target_amount: Option<i64>,
    #[validate(url)]
    pub product_url: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateGiftItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<i64>,
    pub product_url: Option<String>,
    pub image_url: Option<String>,
}
