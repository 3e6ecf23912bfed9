use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{CreateGiftListRequest, GiftList, UpdateGiftListRequest},
    error::{AppError, Result},
};

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateGiftListRequest>,
) -> Result<(StatusCode, Json<GiftList>)> {
    state
        .service_context
        .couple_repo
        .find_by_id(request.couple_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couple profile not found".to_string()))?;

    let title = request
        .title
        .as_deref()
        .unwrap_or(CreateGiftListRequest::default_title());
    let description = request
        .description
        .as_deref()
        .unwrap_or(CreateGiftListRequest::default_description());

    let list = state
        .service_context
        .gift_list_repo
        .create(request.couple_id, title, description)
        .await?;

    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<GiftList>> {
    let list = state
        .service_context
        .gift_list_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Gift list not found".to_string()))?;

    Ok(Json(list))
}

pub async fn list_by_couple(
    State(state): State<AppState>,
    Path(couple_id): Path<Uuid>,
) -> Result<Json<Vec<GiftList>>> {
    let lists = state
        .service_context
        .gift_list_repo
        .list_by_couple(couple_id)
        .await?;

    Ok(Json(lists))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGiftListRequest>,
) -> Result<Json<GiftList>> {
    let list = state.service_context.gift_list_repo.update(id, request).await?;

    Ok(Json(list))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    state.service_context.gift_list_repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
