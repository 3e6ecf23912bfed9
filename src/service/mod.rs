pub mod payment_service;

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::repository::*;

pub use payment_service::{CheckoutCreated, CheckoutRequest, PaymentService, Reconciliation};

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub couple_repo: Arc<dyn CoupleRepository>,
    pub gift_list_repo: Arc<dyn GiftListRepository>,
    pub gift_item_repo: Arc<dyn GiftItemRepository>,
    pub payment_session_repo: Arc<dyn PaymentSessionRepository>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        couple_repo: Arc<dyn CoupleRepository>,
        gift_list_repo: Arc<dyn GiftListRepository>,
        gift_item_repo: Arc<dyn GiftItemRepository>,
        payment_session_repo: Arc<dyn PaymentSessionRepository>,
        db_pool: SqlitePool,
    ) -> Self {
        Self {
            user_repo,
            couple_repo,
            gift_list_repo,
            gift_item_repo,
            payment_session_repo,
            db_pool,
        }
    }
}
