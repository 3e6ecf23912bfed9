use async_trait::async_trait;
use stripe::{
    CheckoutSession, CheckoutSessionMode, CheckoutSessionPaymentStatus, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems, Currency, EventObject, EventType,
    Webhook, WebhookError,
};

use crate::{
    error::{AppError, Result},
    payments::{CheckoutGateway, CheckoutSpec, LineItem, ProviderCheckout},
};

pub struct StripeGateway {
    client: Client,
}

impl StripeGateway {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(api_key),
        }
    }
}

#[async_trait]
impl CheckoutGateway for StripeGateway {
    async fn create_session(&self, spec: CheckoutSpec) -> Result<ProviderCheckout> {
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.success_url = Some(&spec.success_url);
        params.cancel_url = Some(&spec.cancel_url);

        params.line_items = Some(vec![match &spec.line_item {
            LineItem::Price { price_id } => CreateCheckoutSessionLineItems {
                price: Some(price_id.clone()),
                quantity: Some(1),
                ..Default::default()
            },
            LineItem::AdHoc {
                name,
                description,
                amount,
                currency,
            } => CreateCheckoutSessionLineItems {
                price_data: Some(stripe::CreateCheckoutSessionLineItemsPriceData {
                    currency: parse_currency(currency),
                    // JPY is zero-decimal: the unit amount is whole yen.
                    unit_amount: Some(*amount),
                    product_data: Some(stripe::CreateCheckoutSessionLineItemsPriceDataProductData {
                        name: name.clone(),
                        description: description.clone(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                quantity: Some(1),
                ..Default::default()
            },
        }]);

        params.metadata = Some(spec.metadata.clone());

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| AppError::External(format!("Stripe error: {}", e)))?;

        let checkout_url = session
            .url
            .ok_or_else(|| AppError::External("No checkout URL returned".to_string()))?;

        Ok(ProviderCheckout {
            session_id: session.id.to_string(),
            checkout_url,
        })
    }
}

fn parse_currency(code: &str) -> Currency {
    serde_json::from_value(serde_json::Value::String(code.to_lowercase()))
        .unwrap_or(Currency::JPY)
}

/// Webhook event reduced to what the reconciler acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEvent {
    /// `checkout.session.completed`. A completed session is not the same
    /// as a settled payment: async payment methods complete the session
    /// before funds clear, so `paid` carries the payment status.
    Completed {
        session_id: String,
        payment_intent_id: Option<String>,
        paid: bool,
    },
    /// Anything else; acknowledged without side effects.
    Ignored { event_type: String },
}

/// Verify the Stripe signature over the raw payload and reduce the event.
pub fn verify_and_parse(payload: &str, signature: &str, webhook_secret: &str) -> Result<CheckoutEvent> {
    let event = Webhook::construct_event(payload, signature, webhook_secret).map_err(|e| match e {
        WebhookError::BadSignature | WebhookError::BadHeader(_) | WebhookError::BadTimestamp(_) => {
            AppError::BadRequest("Invalid signature".to_string())
        }
        _ => AppError::External(format!("Webhook error: {}", e)),
    })?;

    match event.type_ {
        EventType::CheckoutSessionCompleted => {
            if let EventObject::CheckoutSession(session) = event.data.object {
                Ok(CheckoutEvent::Completed {
                    session_id: session.id.to_string(),
                    // payment_intent arrives as a bare id or an expanded
                    // object; normalize to the id either way.
                    payment_intent_id: session.payment_intent.as_ref().map(|pi| pi.id().to_string()),
                    paid: session.payment_status == CheckoutSessionPaymentStatus::Paid,
                })
            } else {
                Err(AppError::External(
                    "checkout.session.completed carried no session object".to_string(),
                ))
            }
        }
        other => Ok(CheckoutEvent::Ignored {
            event_type: format!("{:?}", other),
        }),
    }
}
