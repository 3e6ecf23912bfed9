use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use shugibako::{
    api,
    config::Settings,
    domain::{CreateCoupleProfileRequest, CreateGiftItemRequest, CreateUserRequest},
    payments::{signing::stripe_signature_header, FakeStripeGateway},
    repository::{
        CoupleRepository, GiftItemRepository, GiftListRepository, PaymentSessionRepository,
        SqliteCoupleRepository, SqliteGiftItemRepository, SqliteGiftListRepository,
        SqlitePaymentSessionRepository, SqliteUserRepository, UserRepository,
    },
    service::{PaymentService, ServiceContext},
};

const WEBHOOK_SECRET: &str = "whsec_test";

struct TestApp {
    app: Router,
    sessions: Arc<SqlitePaymentSessionRepository>,
    gift_item_id: Uuid,
    slug: String,
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.stripe.enabled = true;
    settings.stripe.secret_key = Some("sk_test_xxx".to_string());
    settings.stripe.webhook_secret = Some(WEBHOOK_SECRET.to_string());
    settings.stripe.publish_fee_price_id = Some("price_publish_fee".to_string());
    settings
}

async fn spawn_app(with_payments: bool) -> anyhow::Result<TestApp> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_repo = Arc::new(SqliteUserRepository::new(pool.clone()));
    let couple_repo = Arc::new(SqliteCoupleRepository::new(pool.clone()));
    let gift_list_repo = Arc::new(SqliteGiftListRepository::new(pool.clone()));
    let gift_item_repo = Arc::new(SqliteGiftItemRepository::new(pool.clone()));
    let sessions = Arc::new(SqlitePaymentSessionRepository::new(pool.clone()));

    let user = user_repo
        .create(CreateUserRequest {
            email: "couple@example.com".to_string(),
            display_name: "Taro".to_string(),
        })
        .await?;
    let couple = couple_repo
        .create(
            CreateCoupleProfileRequest {
                user_id: user.id,
                partner_one_name: "太郎".to_string(),
                partner_two_name: "花子".to_string(),
                wedding_date: None,
                greeting: Some("ようこそ".to_string()),
            },
            "w-apitest".to_string(),
        )
        .await?;
    let list = gift_list_repo.create(couple.id, "リスト", "説明").await?;
    let item = gift_item_repo
        .create(
            list.id,
            CreateGiftItemRequest {
                name: "ペアグラスセット".to_string(),
                description: None,
                target_amount: Some(8800),
                product_url: None,
                image_url: None,
            },
        )
        .await?;

    let settings = Arc::new(test_settings());
    let service_context = Arc::new(ServiceContext::new(
        user_repo,
        couple_repo,
        gift_list_repo,
        gift_item_repo,
        sessions.clone(),
        pool.clone(),
    ));

    let payments = with_payments.then(|| {
        Arc::new(PaymentService::new(
            Arc::new(FakeStripeGateway::new()),
            sessions.clone(),
            WEBHOOK_SECRET.to_string(),
            settings.clone(),
        ))
    });

    let app = api::create_app(service_context, payments, settings);

    Ok(TestApp {
        app,
        sessions,
        gift_item_id: item.id,
        slug: couple.slug,
    })
}

fn json_post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn health_check_answers() -> anyhow::Result<()> {
    let test_app = spawn_app(true).await?;

    let response = test_app
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn checkout_over_http_returns_redirect_url() -> anyhow::Result<()> {
    let test_app = spawn_app(true).await?;

    let body = serde_json::json!({
        "kind": "support_contribution",
        "subject_id": test_app.gift_item_id,
        "amount": 5000,
    })
    .to_string();

    let response = test_app
        .app
        .clone()
        .oneshot(json_post("/api/payments/checkout", body))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    let redirect_url = json["redirect_url"].as_str().expect("redirect_url present");
    assert!(redirect_url.contains("cs_test_1"));

    // The session is pollable straight away, still pending.
    let response = test_app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/payments/sessions/cs_test_1")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert_eq!(json["status"], "pending");
    assert_eq!(json["amount"], 5000);

    Ok(())
}

#[tokio::test]
async fn checkout_rejects_non_positive_amount_over_http() -> anyhow::Result<()> {
    let test_app = spawn_app(true).await?;

    let body = serde_json::json!({
        "kind": "support_contribution",
        "subject_id": test_app.gift_item_id,
        "amount": 0,
    })
    .to_string();

    let response = test_app
        .app
        .oneshot(json_post("/api/payments/checkout", body))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn webhook_without_signature_header_is_rejected() -> anyhow::Result<()> {
    let test_app = spawn_app(true).await?;

    let response = test_app
        .app
        .oneshot(json_post(
            "/api/payments/webhook/stripe",
            r#"{"type":"checkout.session.completed"}"#.to_string(),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn tampered_webhook_leaves_the_session_pending() -> anyhow::Result<()> {
    let test_app = spawn_app(true).await?;

    // Create a pending session first.
    let body = serde_json::json!({
        "kind": "support_contribution",
        "subject_id": test_app.gift_item_id,
        "amount": 5000,
    })
    .to_string();
    let response = test_app
        .app
        .clone()
        .oneshot(json_post("/api/payments/checkout", body))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Sign a payload, then deliver a different one under that signature.
    let payload = r#"{"type":"checkout.session.completed","id":"evt_1"}"#;
    let signature =
        stripe_signature_header(payload, WEBHOOK_SECRET, chrono::Utc::now().timestamp());
    let tampered = payload.replace("evt_1", "evt_2");

    let request = Request::builder()
        .method("POST")
        .uri("/api/payments/webhook/stripe")
        .header(header::CONTENT_TYPE, "application/json")
        .header("stripe-signature", signature)
        .body(Body::from(tampered))
        .unwrap();

    let response = test_app.app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No store mutation happened.
    let session = test_app
        .sessions
        .find_by_stripe_session_id("cs_test_1")
        .await?
        .expect("session should exist");
    assert_eq!(
        session.status,
        shugibako::domain::SessionStatus::Pending
    );

    Ok(())
}

#[tokio::test]
async fn payment_endpoints_answer_503_when_unconfigured() -> anyhow::Result<()> {
    let test_app = spawn_app(false).await?;

    let body = serde_json::json!({
        "kind": "support_contribution",
        "subject_id": test_app.gift_item_id,
        "amount": 5000,
    })
    .to_string();

    let response = test_app
        .app
        .clone()
        .oneshot(json_post("/api/payments/checkout", body))
        .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = test_app
        .app
        .oneshot(json_post(
            "/api/payments/webhook/stripe",
            "{}".to_string(),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    Ok(())
}

#[tokio::test]
async fn public_page_reports_raised_amounts_and_publish_state() -> anyhow::Result<()> {
    let test_app = spawn_app(true).await?;

    // A settled contribution and a pending one.
    for _ in 0..2 {
        let body = serde_json::json!({
            "kind": "support_contribution",
            "subject_id": test_app.gift_item_id,
            "amount": 5000,
        })
        .to_string();
        let response = test_app
            .app
            .clone()
            .oneshot(json_post("/api/payments/checkout", body))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert!(test_app.sessions.mark_paid("cs_test_1", Some("pi_1")).await?);

    let response = test_app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/public/pages/{}", test_app.slug))
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await?;
    assert_eq!(json["published"], false);
    let items = json["gift_list"]["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    // Only the settled contribution counts.
    assert_eq!(items[0]["raised_amount"], 5000);

    Ok(())
}

#[tokio::test]
async fn unknown_public_slug_is_404() -> anyhow::Result<()> {
    let test_app = spawn_app(true).await?;

    let response = test_app
        .app
        .oneshot(
            Request::builder()
                .uri("/public/pages/w-nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}
