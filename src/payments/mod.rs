use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;

pub mod stripe_client;

#[cfg(any(test, feature = "test-utils"))]
pub mod signing;

pub use stripe_client::{verify_and_parse, CheckoutEvent, StripeGateway};

/// What the initiator asks the payment provider to host.
#[derive(Debug, Clone)]
pub struct CheckoutSpec {
    pub line_item: LineItem,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub enum LineItem {
    /// Pre-registered Stripe price (the publish fee).
    Price { price_id: String },
    /// Ad-hoc price built from amount + currency + description.
    AdHoc {
        name: String,
        description: Option<String>,
        amount: i64,
        currency: String,
    },
}

/// Provider response the initiator needs: the correlation key and the
/// hosted checkout URL the client is redirected to.
#[derive(Debug, Clone)]
pub struct ProviderCheckout {
    pub session_id: String,
    pub checkout_url: String,
}

/// Seam between the checkout initiator and the payment provider, so
/// handlers receive an injected client instead of a module-level one.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_session(&self, spec: CheckoutSpec) -> Result<ProviderCheckout>;
}

/// In-memory gateway for integration tests: hands out sequential
/// `cs_test_N` session ids and records every spec it was asked to create.
#[cfg(any(test, feature = "test-utils"))]
pub struct FakeStripeGateway {
    calls: std::sync::Mutex<Vec<CheckoutSpec>>,
    fail: bool,
}

#[cfg(any(test, feature = "test-utils"))]
impl FakeStripeGateway {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A gateway whose every create call fails, for provider-outage paths.
    pub fn failing() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_spec(&self) -> Option<CheckoutSpec> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for FakeStripeGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl CheckoutGateway for FakeStripeGateway {
    async fn create_session(&self, spec: CheckoutSpec) -> Result<ProviderCheckout> {
        use crate::error::AppError;

        let mut calls = self.calls.lock().unwrap();
        if self.fail {
            return Err(AppError::External("Stripe error: connection refused".to_string()));
        }
        calls.push(spec);
        let n = calls.len();
        Ok(ProviderCheckout {
            session_id: format!("cs_test_{}", n),
            checkout_url: format!("https://checkout.stripe.test/c/pay/cs_test_{}", n),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_gateway_hands_out_sequential_sessions() {
        let gateway = FakeStripeGateway::new();
        let spec = CheckoutSpec {
            line_item: LineItem::AdHoc {
                name: "ギフト支援".to_string(),
                description: None,
                amount: 5000,
                currency: "JPY".to_string(),
            },
            success_url: "http://localhost/success".to_string(),
            cancel_url: "http://localhost/cancel".to_string(),
            metadata: HashMap::new(),
        };

        let first = gateway.create_session(spec.clone()).await.unwrap();
        let second = gateway.create_session(spec).await.unwrap();

        assert_eq!(first.session_id, "cs_test_1");
        assert_eq!(second.session_id, "cs_test_2");
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn failing_gateway_records_no_calls() {
        let gateway = FakeStripeGateway::failing();
        let spec = CheckoutSpec {
            line_item: LineItem::Price {
                price_id: "price_123".to_string(),
            },
            success_url: "http://localhost/success".to_string(),
            cancel_url: "http://localhost/cancel".to_string(),
            metadata: HashMap::new(),
        };

        assert!(gateway.create_session(spec).await.is_err());
        assert_eq!(gateway.call_count(), 0);
    }
}
