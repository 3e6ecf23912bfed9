use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::state::AppState,
    domain::{CreateUserRequest, User},
    error::{AppError, Result},
};

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    request.validate()?;

    let user = state
        .service_context
        .user_repo
        .create(request)
        .await
        .map_err(|e| match e {
            AppError::Database(msg) if msg.contains("UNIQUE") => {
                AppError::Conflict("Email already registered".to_string())
            }
            _ => e,
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<User>> {
    let user = state
        .service_context
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
