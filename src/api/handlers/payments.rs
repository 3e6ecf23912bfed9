use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    api::state::AppState,
    domain::{PaymentKind, PaymentSession, SessionStatus},
    error::{AppError, Result},
    service::{CheckoutRequest, PaymentService},
};

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub stripe_session_id: String,
    pub kind: PaymentKind,
    pub amount: i64,
    pub currency: String,
    pub status: SessionStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<PaymentSession> for SessionStatusResponse {
    fn from(session: PaymentSession) -> Self {
        Self {
            stripe_session_id: session.stripe_session_id,
            kind: session.kind,
            amount: session.amount,
            currency: session.currency,
            status: session.status,
            completed_at: session.completed_at,
        }
    }
}

fn payments(state: &AppState) -> Result<&Arc<PaymentService>> {
    state
        .payments
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Payments are not configured".to_string()))
}

pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let created = payments(&state)?.create_checkout(request).await?;

    Ok(Json(CheckoutResponse {
        redirect_url: created.redirect_url,
    }))
}

/// Stripe delivers events here. Signature verification needs the raw
/// body, so the payload is taken as text and parsed after the check.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>> {
    let payments = payments(&state)?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing stripe-signature header".to_string()))?;

    let event = payments.verify_event(&body, signature)?;
    payments.apply_event(event).await?;

    // 200 regardless of whether a row was updated, so Stripe stops
    // redelivering.
    Ok(Json(json!({ "received": true })))
}

/// Success pages poll this while the webhook is still in flight.
pub async fn get_session(
    State(state): State<AppState>,
    Path(stripe_session_id): Path<String>,
) -> Result<Json<SessionStatusResponse>> {
    let session = state
        .service_context
        .payment_session_repo
        .find_by_stripe_session_id(&stripe_session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment session not found".to_string()))?;

    Ok(Json(session.into()))
}
