use std::sync::Arc;

use crate::{config::Settings, service::PaymentService, service::ServiceContext};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    /// None when Stripe is disabled or unconfigured; payment endpoints
    /// answer 503 in that case.
    pub payments: Option<Arc<PaymentService>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        payments: Option<Arc<PaymentService>>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            service_context,
            payments,
            settings,
        }
    }
}
