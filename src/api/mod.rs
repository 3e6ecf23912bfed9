pub mod handlers;
pub mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::PaymentService, service::ServiceContext};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    payments: Option<Arc<PaymentService>>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, payments, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // API routes
        .nest("/api", api_routes())
        // Public routes (consumed by the supporter-facing pages)
        .nest("/public", public_routes())
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/couples", couple_routes())
        .nest("/gift-lists", gift_list_routes())
        .nest("/gift-items", gift_item_routes())
        .nest("/payments", payment_routes())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::users::create))
        .route("/:id", get(handlers::users::get))
}

fn couple_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::couples::create))
        .route("/:id", get(handlers::couples::get))
        .route("/:id", put(handlers::couples::update))
        .route("/:id/gift-lists", get(handlers::gift_lists::list_by_couple))
}

fn gift_list_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::gift_lists::create))
        .route("/:id", get(handlers::gift_lists::get))
        .route("/:id", put(handlers::gift_lists::update))
        .route("/:id", delete(handlers::gift_lists::delete))
        .route("/:id/items", get(handlers::gift_items::list_by_gift_list))
        .route("/:id/items", post(handlers::gift_items::create))
}

fn gift_item_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(handlers::gift_items::get))
        .route("/:id", put(handlers::gift_items::update))
        .route("/:id", delete(handlers::gift_items::delete))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(handlers::payments::create_checkout))
        // Stripe calls this; signature verification is the only auth.
        .route("/webhook/stripe", post(handlers::payments::stripe_webhook))
        .route("/sessions/:stripe_session_id", get(handlers::payments::get_session))
}

fn public_routes() -> Router<AppState> {
    Router::new().route("/pages/:slug", get(handlers::public::page_by_slug))
}
