use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::state::AppState,
    domain::{CoupleProfile, CreateCoupleProfileRequest, UpdateCoupleProfileRequest},
    error::{AppError, Result},
};

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateCoupleProfileRequest>,
) -> Result<(StatusCode, Json<CoupleProfile>)> {
    request.validate()?;

    // One profile per user; creating twice is a conflict.
    if state
        .service_context
        .couple_repo
        .find_by_user(request.user_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Couple profile already exists for this user".to_string(),
        ));
    }

    let slug = generate_slug();
    let couple = state.service_context.couple_repo.create(request, slug).await?;

    Ok((StatusCode::CREATED, Json(couple)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CoupleProfile>> {
    let couple = state
        .service_context
        .couple_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couple profile not found".to_string()))?;

    Ok(Json(couple))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCoupleProfileRequest>,
) -> Result<Json<CoupleProfile>> {
    let couple = state.service_context.couple_repo.update(id, request).await?;

    Ok(Json(couple))
}

/// Random path segment for the public page. Names stay out of the URL so
/// the page is only reachable by sharing the link.
fn generate_slug() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("w-{}", suffix.to_lowercase())
}
