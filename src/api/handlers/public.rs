use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::GiftItem,
    error::{AppError, Result},
};

/// Everything the supporter-facing page needs in one payload: the couple,
/// their list, and the items with how much has been raised so far.
#[derive(Debug, Serialize)]
pub struct PublicPage {
    pub slug: String,
    pub partner_one_name: String,
    pub partner_two_name: String,
    pub wedding_date: Option<NaiveDate>,
    pub greeting: Option<String>,
    pub published: bool,
    pub gift_list: Option<PublicGiftList>,
}

#[derive(Debug, Serialize)]
pub struct PublicGiftList {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub items: Vec<PublicGiftItem>,
}

#[derive(Debug, Serialize)]
pub struct PublicGiftItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: Option<i64>,
    pub product_url: Option<String>,
    pub image_url: Option<String>,
    /// Sum of settled contributions, whole yen. Pending checkouts do not
    /// count.
    pub raised_amount: i64,
}

pub async fn page_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicPage>> {
    let ctx = &state.service_context;

    let couple = ctx
        .couple_repo
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Page not found".to_string()))?;

    // The original flow keeps one list per couple; take the earliest.
    let gift_list = ctx
        .gift_list_repo
        .list_by_couple(couple.id)
        .await?
        .into_iter()
        .next();

    let (published, gift_list) = match gift_list {
        Some(list) => {
            let published = ctx
                .payment_session_repo
                .has_paid_publish_fee(list.id)
                .await?;

            let items = ctx.gift_item_repo.list_by_gift_list(list.id).await?;
            let mut public_items = Vec::with_capacity(items.len());
            for item in items {
                public_items.push(to_public_item(&state, item).await?);
            }

            (
                published,
                Some(PublicGiftList {
                    id: list.id,
                    title: list.title,
                    description: list.description,
                    items: public_items,
                }),
            )
        }
        None => (false, None),
    };

    Ok(Json(PublicPage {
        slug: couple.slug,
        partner_one_name: couple.partner_one_name,
        partner_two_name: couple.partner_two_name,
        wedding_date: couple.wedding_date,
        greeting: couple.greeting,
        published,
        gift_list,
    }))
}

async fn to_public_item(state: &AppState, item: GiftItem) -> Result<PublicGiftItem> {
    let raised_amount = state
        .service_context
        .payment_session_repo
        .total_contributed(item.id)
        .await?;

    Ok(PublicGiftItem {
        id: item.id,
        name: item.name,
        description: item.description,
        target_amount: item.target_amount,
        product_url: item.product_url,
        image_url: item.image_url,
        raised_amount,
    })
}
