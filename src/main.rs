use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shugibako::{
    api,
    config::Settings,
    payments::StripeGateway,
    repository,
    service::{PaymentService, ServiceContext},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shugibako=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!(
        "Starting Shugibako server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Initialize repositories
    let user_repo = Arc::new(repository::SqliteUserRepository::new(db_pool.clone()));
    let couple_repo = Arc::new(repository::SqliteCoupleRepository::new(db_pool.clone()));
    let gift_list_repo = Arc::new(repository::SqliteGiftListRepository::new(db_pool.clone()));
    let gift_item_repo = Arc::new(repository::SqliteGiftItemRepository::new(db_pool.clone()));
    let payment_session_repo =
        Arc::new(repository::SqlitePaymentSessionRepository::new(db_pool.clone()));

    let service_context = Arc::new(ServiceContext::new(
        user_repo,
        couple_repo,
        gift_list_repo,
        gift_item_repo,
        payment_session_repo.clone(),
        db_pool.clone(),
    ));

    let settings = Arc::new(settings);

    // Wire up Stripe if configured
    let payment_service = if settings.stripe.enabled {
        if let (Some(api_key), Some(webhook_secret)) = (
            settings.stripe.secret_key.clone(),
            settings.stripe.webhook_secret.clone(),
        ) {
            tracing::info!("Stripe payment processing enabled");
            let gateway = Arc::new(StripeGateway::new(api_key));
            Some(Arc::new(PaymentService::new(
                gateway,
                payment_session_repo,
                webhook_secret,
                settings.clone(),
            )))
        } else {
            tracing::warn!("Stripe enabled but missing configuration");
            None
        }
    } else {
        tracing::info!("Stripe payment processing disabled");
        None
    };

    let app = api::create_app(service_context, payment_service, settings.clone());

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
