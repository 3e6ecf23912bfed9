use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Shugibako API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Wedding gift registry with Stripe-backed goshugi payments",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "api": "/api",
            "public": "/public"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
