use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use shugibako::{
    config::Settings,
    domain::{
        CreateCoupleProfileRequest, CreateGiftItemRequest, CreateUserRequest, PaymentKind,
        SessionStatus, Subject,
    },
    payments::{CheckoutEvent, FakeStripeGateway, LineItem},
    repository::{
        CoupleRepository, GiftItemRepository, GiftListRepository, PaymentSessionRepository,
        SqliteCoupleRepository, SqliteGiftItemRepository, SqliteGiftListRepository,
        SqlitePaymentSessionRepository, SqliteUserRepository, UserRepository,
    },
    service::{CheckoutRequest, PaymentService, Reconciliation},
};

struct TestEnv {
    pool: SqlitePool,
    gateway: Arc<FakeStripeGateway>,
    service: PaymentService,
    sessions: Arc<SqlitePaymentSessionRepository>,
    gift_list_id: Uuid,
    gift_item_id: Uuid,
    user_id: Uuid,
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.stripe.enabled = true;
    settings.stripe.secret_key = Some("sk_test_xxx".to_string());
    settings.stripe.webhook_secret = Some("whsec_test".to_string());
    settings.stripe.publish_fee_price_id = Some("price_publish_fee".to_string());
    settings
}

async fn setup() -> anyhow::Result<TestEnv> {
    setup_with_gateway(Arc::new(FakeStripeGateway::new())).await
}

async fn setup_with_gateway(gateway: Arc<FakeStripeGateway>) -> anyhow::Result<TestEnv> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user = SqliteUserRepository::new(pool.clone())
        .create(CreateUserRequest {
            email: "couple@example.com".to_string(),
            display_name: "Taro".to_string(),
        })
        .await?;
    let couple = SqliteCoupleRepository::new(pool.clone())
        .create(
            CreateCoupleProfileRequest {
                user_id: user.id,
                partner_one_name: "太郎".to_string(),
                partner_two_name: "花子".to_string(),
                wedding_date: None,
                greeting: None,
            },
            "w-test".to_string(),
        )
        .await?;
    let list = SqliteGiftListRepository::new(pool.clone())
        .create(couple.id, "リスト", "説明")
        .await?;
    let item = SqliteGiftItemRepository::new(pool.clone())
        .create(
            list.id,
            CreateGiftItemRequest {
                name: "ダイソン掃除機 V12".to_string(),
                description: None,
                target_amount: Some(69800),
                product_url: None,
                image_url: None,
            },
        )
        .await?;

    let sessions = Arc::new(SqlitePaymentSessionRepository::new(pool.clone()));
    let service = PaymentService::new(
        gateway.clone(),
        sessions.clone(),
        "whsec_test".to_string(),
        Arc::new(test_settings()),
    );

    Ok(TestEnv {
        pool,
        gateway,
        service,
        sessions,
        gift_list_id: list.id,
        gift_item_id: item.id,
        user_id: user.id,
    })
}

async fn session_count(pool: &SqlitePool) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payment_sessions")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[tokio::test]
async fn publish_fee_checkout_then_paid_webhook() -> anyhow::Result<()> {
    let env = setup().await?;

    let created = env
        .service
        .create_checkout(CheckoutRequest {
            kind: PaymentKind::PublishFee,
            subject_id: Some(env.gift_list_id),
            amount: None,
        })
        .await?;

    assert!(created.redirect_url.contains("cs_test_1"));
    assert_eq!(created.session.amount, 3000);
    assert_eq!(created.session.status, SessionStatus::Pending);
    assert_eq!(created.session.kind, PaymentKind::PublishFee);
    assert_eq!(created.session.subject, Subject::GiftList(env.gift_list_id));

    // The fixed fee uses the pre-registered price, and the redirect comes
    // back to the dashboard with the session placeholder.
    let spec = env.gateway.last_spec().expect("gateway was called");
    assert!(matches!(spec.line_item, LineItem::Price { ref price_id } if price_id == "price_publish_fee"));
    assert!(spec.success_url.contains(&env.gift_list_id.to_string()));
    assert!(spec.success_url.contains("{CHECKOUT_SESSION_ID}"));
    assert_eq!(spec.metadata.get("kind").map(String::as_str), Some("publish_fee"));
    assert_eq!(
        spec.metadata.get("gift_list_id"),
        Some(&env.gift_list_id.to_string())
    );

    let outcome = env
        .service
        .apply_event(CheckoutEvent::Completed {
            session_id: "cs_test_1".to_string(),
            payment_intent_id: Some("pi_1".to_string()),
            paid: true,
        })
        .await?;
    assert_eq!(outcome, Reconciliation::Updated);

    let session = env
        .sessions
        .find_by_stripe_session_id("cs_test_1")
        .await?
        .expect("session should exist");
    assert_eq!(session.status, SessionStatus::Paid);
    assert_eq!(session.stripe_payment_intent_id.as_deref(), Some("pi_1"));
    assert!(session.completed_at.is_some());

    Ok(())
}

#[tokio::test]
async fn support_contribution_creates_pending_session() -> anyhow::Result<()> {
    let env = setup().await?;

    let created = env
        .service
        .create_checkout(CheckoutRequest {
            kind: PaymentKind::SupportContribution,
            subject_id: Some(env.gift_item_id),
            amount: Some(5000),
        })
        .await?;

    assert_eq!(created.session.amount, 5000);
    assert_eq!(created.session.kind, PaymentKind::SupportContribution);
    assert_eq!(created.session.subject, Subject::GiftItem(env.gift_item_id));
    assert_eq!(session_count(&env.pool).await?, 1);

    // Guest-supplied amount becomes an ad-hoc line item in whole yen.
    let spec = env.gateway.last_spec().expect("gateway was called");
    match spec.line_item {
        LineItem::AdHoc { amount, ref currency, .. } => {
            assert_eq!(amount, 5000);
            assert_eq!(currency, "JPY");
        }
        ref other => panic!("expected ad-hoc line item, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn non_positive_amounts_never_reach_the_gateway() -> anyhow::Result<()> {
    let env = setup().await?;

    for amount in [None, Some(0), Some(-500)] {
        let result = env
            .service
            .create_checkout(CheckoutRequest {
                kind: PaymentKind::SupportContribution,
                subject_id: Some(env.gift_item_id),
                amount,
            })
            .await;
        assert!(result.is_err());
    }

    assert_eq!(env.gateway.call_count(), 0);
    assert_eq!(session_count(&env.pool).await?, 0);

    Ok(())
}

#[tokio::test]
async fn missing_subject_id_is_rejected_before_any_call() -> anyhow::Result<()> {
    let env = setup().await?;

    for kind in [
        PaymentKind::PublishFee,
        PaymentKind::SupportContribution,
        PaymentKind::Onboarding,
    ] {
        let result = env
            .service
            .create_checkout(CheckoutRequest {
                kind,
                subject_id: None,
                amount: Some(5000),
            })
            .await;
        assert!(result.is_err());
    }

    assert_eq!(env.gateway.call_count(), 0);
    assert_eq!(session_count(&env.pool).await?, 0);

    Ok(())
}

#[tokio::test]
async fn onboarding_uses_the_configured_fixed_fee() -> anyhow::Result<()> {
    let env = setup().await?;

    let created = env
        .service
        .create_checkout(CheckoutRequest {
            kind: PaymentKind::Onboarding,
            subject_id: Some(env.user_id),
            // Client-supplied amounts are ignored for fixed-fee kinds.
            amount: Some(99999),
        })
        .await?;

    assert_eq!(created.session.amount, 1000);
    assert_eq!(created.session.subject, Subject::User(env.user_id));

    Ok(())
}

#[tokio::test]
async fn gateway_failure_leaves_no_local_record() -> anyhow::Result<()> {
    let env = setup_with_gateway(Arc::new(FakeStripeGateway::failing())).await?;

    let result = env
        .service
        .create_checkout(CheckoutRequest {
            kind: PaymentKind::SupportContribution,
            subject_id: Some(env.gift_item_id),
            amount: Some(5000),
        })
        .await;

    assert!(result.is_err());
    assert_eq!(session_count(&env.pool).await?, 0);

    Ok(())
}

#[tokio::test]
async fn duplicate_paid_events_transition_once() -> anyhow::Result<()> {
    let env = setup().await?;

    env.service
        .create_checkout(CheckoutRequest {
            kind: PaymentKind::SupportContribution,
            subject_id: Some(env.gift_item_id),
            amount: Some(5000),
        })
        .await?;

    let event = CheckoutEvent::Completed {
        session_id: "cs_test_1".to_string(),
        payment_intent_id: Some("pi_1".to_string()),
        paid: true,
    };

    assert_eq!(env.service.apply_event(event.clone()).await?, Reconciliation::Updated);
    assert_eq!(env.service.apply_event(event).await?, Reconciliation::NoOp);

    let session = env
        .sessions
        .find_by_stripe_session_id("cs_test_1")
        .await?
        .expect("session should exist");
    assert_eq!(session.status, SessionStatus::Paid);

    Ok(())
}

#[tokio::test]
async fn out_of_order_webhook_is_acknowledged_not_errored() -> anyhow::Result<()> {
    let env = setup().await?;

    let outcome = env
        .service
        .apply_event(CheckoutEvent::Completed {
            session_id: "cs_not_ours".to_string(),
            payment_intent_id: Some("pi_x".to_string()),
            paid: true,
        })
        .await?;

    assert_eq!(outcome, Reconciliation::NoOp);

    Ok(())
}

#[tokio::test]
async fn completed_but_unpaid_session_is_skipped() -> anyhow::Result<()> {
    let env = setup().await?;

    env.service
        .create_checkout(CheckoutRequest {
            kind: PaymentKind::SupportContribution,
            subject_id: Some(env.gift_item_id),
            amount: Some(5000),
        })
        .await?;

    // Async payment methods complete the session before funds settle.
    let outcome = env
        .service
        .apply_event(CheckoutEvent::Completed {
            session_id: "cs_test_1".to_string(),
            payment_intent_id: None,
            paid: false,
        })
        .await?;
    assert_eq!(outcome, Reconciliation::Skipped);

    let session = env
        .sessions
        .find_by_stripe_session_id("cs_test_1")
        .await?
        .expect("session should exist");
    assert_eq!(session.status, SessionStatus::Pending);
    assert!(session.completed_at.is_none());

    Ok(())
}

#[tokio::test]
async fn ignored_event_types_touch_nothing() -> anyhow::Result<()> {
    let env = setup().await?;

    env.service
        .create_checkout(CheckoutRequest {
            kind: PaymentKind::SupportContribution,
            subject_id: Some(env.gift_item_id),
            amount: Some(5000),
        })
        .await?;

    let outcome = env
        .service
        .apply_event(CheckoutEvent::Ignored {
            event_type: "PaymentIntentCreated".to_string(),
        })
        .await?;
    assert_eq!(outcome, Reconciliation::Skipped);

    let session = env
        .sessions
        .find_by_stripe_session_id("cs_test_1")
        .await?
        .expect("session should exist");
    assert_eq!(session.status, SessionStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn retried_checkout_creates_a_new_row() -> anyhow::Result<()> {
    let env = setup().await?;

    let request = CheckoutRequest {
        kind: PaymentKind::SupportContribution,
        subject_id: Some(env.gift_item_id),
        amount: Some(5000),
    };

    let first = env.service.create_checkout(request.clone()).await?;
    let second = env.service.create_checkout(request).await?;

    assert_ne!(first.session.stripe_session_id, second.session.stripe_session_id);
    assert_eq!(session_count(&env.pool).await?, 2);

    Ok(())
}
