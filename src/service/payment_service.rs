use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::Settings,
    domain::{NewPaymentSession, PaymentKind, PaymentSession, Subject},
    error::{AppError, Result},
    payments::{stripe_client, CheckoutEvent, CheckoutGateway, CheckoutSpec, LineItem},
    repository::PaymentSessionRepository,
};

/// Checkout request as it arrives over the wire: `{ kind, subject_id, amount? }`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub kind: PaymentKind,
    pub subject_id: Option<Uuid>,
    /// Whole yen; only meaningful (and only accepted) for contributions.
    pub amount: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CheckoutCreated {
    pub redirect_url: String,
    pub session: PaymentSession,
}

/// Outcome of applying one webhook event to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// One pending session flipped to paid.
    Updated,
    /// Zero rows matched: already processed, or unknown session id.
    NoOp,
    /// Event acknowledged without touching the store.
    Skipped,
}

/// Owns the payment session lifecycle: the checkout initiator and the
/// webhook reconciler, with the provider behind an injected gateway.
pub struct PaymentService {
    gateway: Arc<dyn CheckoutGateway>,
    sessions: Arc<dyn PaymentSessionRepository>,
    webhook_secret: String,
    settings: Arc<Settings>,
}

impl PaymentService {
    pub fn new(
        gateway: Arc<dyn CheckoutGateway>,
        sessions: Arc<dyn PaymentSessionRepository>,
        webhook_secret: String,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            gateway,
            sessions,
            webhook_secret,
            settings,
        }
    }

    /// Validate the request, create the hosted checkout session, insert the
    /// pending row, and hand back the redirect URL. No local record is
    /// created when the provider call fails; callers simply retry.
    pub async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutCreated> {
        let (subject, amount, spec) = self.build_spec(&request)?;

        let checkout = self.gateway.create_session(spec).await?;

        let session = self
            .sessions
            .create(NewPaymentSession {
                stripe_session_id: checkout.session_id.clone(),
                kind: request.kind,
                amount,
                currency: self.settings.stripe.currency.clone(),
                subject,
            })
            .await
            .map_err(|e| {
                // The provider now holds a session we have no row for; an
                // operator has to reconcile it against the Stripe dashboard.
                tracing::error!(
                    stripe_session_id = %checkout.session_id,
                    "Checkout session created but local insert failed: {}",
                    e
                );
                e
            })?;

        Ok(CheckoutCreated {
            redirect_url: checkout.checkout_url,
            session,
        })
    }

    fn build_spec(&self, request: &CheckoutRequest) -> Result<(Subject, i64, CheckoutSpec)> {
        let stripe = &self.settings.stripe;
        let base = self.settings.server.base_url.trim_end_matches('/');

        match request.kind {
            PaymentKind::PublishFee => {
                let gift_list_id = request
                    .subject_id
                    .ok_or_else(|| AppError::BadRequest("Missing gift list id".to_string()))?;
                let price_id = stripe.publish_fee_price_id.clone().ok_or_else(|| {
                    AppError::ServiceUnavailable("Publish fee price is not configured".to_string())
                })?;

                let subject = Subject::GiftList(gift_list_id);
                let spec = CheckoutSpec {
                    line_item: LineItem::Price { price_id },
                    success_url: format!(
                        "{base}/dashboard/gift-lists/{gift_list_id}?publish=success&session_id={{CHECKOUT_SESSION_ID}}"
                    ),
                    cancel_url: format!("{base}/dashboard/gift-lists/{gift_list_id}?publish=cancel"),
                    metadata: Self::metadata(request.kind, subject),
                };
                Ok((subject, stripe.publish_fee_amount, spec))
            }
            PaymentKind::SupportContribution => {
                let gift_item_id = request
                    .subject_id
                    .ok_or_else(|| AppError::BadRequest("Missing gift item id".to_string()))?;
                // The one caller-controlled monetary value in the system;
                // reject before anything reaches the provider.
                let amount = match request.amount {
                    Some(amount) if amount > 0 => amount,
                    _ => return Err(AppError::BadRequest("Invalid amount".to_string())),
                };

                let subject = Subject::GiftItem(gift_item_id);
                let spec = CheckoutSpec {
                    line_item: LineItem::AdHoc {
                        name: "ギフト支援".to_string(),
                        description: Some("ご祝儀リストのアイテムへの支援".to_string()),
                        amount,
                        currency: stripe.currency.clone(),
                    },
                    success_url: format!(
                        "{base}/support/success?item={gift_item_id}&session_id={{CHECKOUT_SESSION_ID}}"
                    ),
                    cancel_url: format!("{base}/support/cancel"),
                    metadata: Self::metadata(request.kind, subject),
                };
                Ok((subject, amount, spec))
            }
            PaymentKind::Onboarding => {
                let user_id = request
                    .subject_id
                    .ok_or_else(|| AppError::BadRequest("Missing user id".to_string()))?;

                let subject = Subject::User(user_id);
                let spec = CheckoutSpec {
                    line_item: LineItem::AdHoc {
                        name: "アカウント登録料".to_string(),
                        description: None,
                        amount: stripe.onboarding_fee_amount,
                        currency: stripe.currency.clone(),
                    },
                    success_url: format!(
                        "{base}/onboarding/success?user={user_id}&session_id={{CHECKOUT_SESSION_ID}}"
                    ),
                    cancel_url: format!("{base}/onboarding/cancel"),
                    metadata: Self::metadata(request.kind, subject),
                };
                Ok((subject, stripe.onboarding_fee_amount, spec))
            }
        }
    }

    fn metadata(kind: PaymentKind, subject: Subject) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("kind".to_string(), kind.as_str().to_string());
        metadata.insert(subject.metadata_key().to_string(), subject.id().to_string());
        metadata
    }

    /// Verify the signature over the raw payload and reduce the event.
    pub fn verify_event(&self, payload: &str, signature: &str) -> Result<CheckoutEvent> {
        stripe_client::verify_and_parse(payload, signature, &self.webhook_secret)
    }

    /// Apply a verified event. Everything that is not a settled checkout
    /// completion is acknowledged without touching the store, and a
    /// zero-row update is a logged no-op so redeliveries stay harmless.
    pub async fn apply_event(&self, event: CheckoutEvent) -> Result<Reconciliation> {
        match event {
            CheckoutEvent::Completed {
                session_id,
                payment_intent_id,
                paid,
            } => {
                if !paid {
                    tracing::warn!(
                        stripe_session_id = %session_id,
                        "checkout.session.completed received but not paid; skipping"
                    );
                    return Ok(Reconciliation::Skipped);
                }

                let updated = self
                    .sessions
                    .mark_paid(&session_id, payment_intent_id.as_deref())
                    .await?;

                if updated {
                    tracing::info!(stripe_session_id = %session_id, "Payment marked as paid");
                    Ok(Reconciliation::Updated)
                } else {
                    tracing::warn!(
                        stripe_session_id = %session_id,
                        "No pending payment session matched; already processed or unknown"
                    );
                    Ok(Reconciliation::NoOp)
                }
            }
            CheckoutEvent::Ignored { event_type } => {
                tracing::debug!("Unhandled webhook event type: {}", event_type);
                Ok(Reconciliation::Skipped)
            }
        }
    }
}
