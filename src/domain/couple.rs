use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupleProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    /// URL path segment of the public page.
    pub slug: String,
    pub partner_one_name: String,
    pub partner_two_name: String,
    pub wedding_date: Option<NaiveDate>,
    pub greeting: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCoupleProfileRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub partner_one_name: String,
    #[validate(length(min = 1, max = 100))]
    pub partner_two_name: String,
    pub wedding_date: Option<NaiveDate>,
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateCoupleProfileRequest {
    pub partner_one_name: Option<String>,
    pub partner_two_name: Option<String>,
    pub wedding_date: Option<NaiveDate>,
    pub greeting: Option<String>,
}
