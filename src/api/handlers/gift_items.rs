use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::state::AppState,
    domain::{CreateGiftItemRequest, GiftItem, UpdateGiftItemRequest},
    error::{AppError, Result},
};

pub async fn create(
    State(state): State<AppState>,
    Path(gift_list_id): Path<Uuid>,
    Json(request): Json<CreateGiftItemRequest>,
) -> Result<(StatusCode, Json<GiftItem>)> {
    request.validate()?;

    state
        .service_context
        .gift_list_repo
        .find_by_id(gift_list_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Gift list not found".to_string()))?;

    let item = state
        .service_context
        .gift_item_repo
        .create(gift_list_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<GiftItem>> {
    let item = state
        .service_context
        .gift_item_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Gift item not found".to_string()))?;

    Ok(Json(item))
}

pub async fn list_by_gift_list(
    State(state): State<AppState>,
    Path(gift_list_id): Path<Uuid>,
) -> Result<Json<Vec<GiftItem>>> {
    let items = state
        .service_context
        .gift_item_repo
        .list_by_gift_list(gift_list_id)
        .await?;

    Ok(Json(items))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGiftItemRequest>,
) -> Result<Json<GiftItem>> {
    let item = state.service_context.gift_item_repo.update(id, request).await?;

    Ok(Json(item))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    state.service_context.gift_item_repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
