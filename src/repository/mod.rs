use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod couple_repository;
pub mod gift_item_repository;
pub mod gift_list_repository;
pub mod payment_session_repository;
pub mod user_repository;

pub use couple_repository::SqliteCoupleRepository;
pub use gift_item_repository::SqliteGiftItemRepository;
pub use gift_list_repository::SqliteGiftListRepository;
pub use payment_session_repository::SqlitePaymentSessionRepository;
pub use user_repository::SqliteUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: CreateUserRequest) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait CoupleRepository: Send + Sync {
    async fn create(&self, couple: CreateCoupleProfileRequest, slug: String) -> Result<CoupleProfile>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CoupleProfile>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<CoupleProfile>>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<CoupleProfile>>;
    async fn update(&self, id: Uuid, update: UpdateCoupleProfileRequest) -> Result<CoupleProfile>;
}

#[async_trait]
pub trait GiftListRepository: Send + Sync {
    async fn create(&self, couple_id: Uuid, title: &str, description: &str) -> Result<GiftList>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<GiftList>>;
    async fn list_by_couple(&self, couple_id: Uuid) -> Result<Vec<GiftList>>;
    async fn update(&self, id: Uuid, update: UpdateGiftListRequest) -> Result<GiftList>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait GiftItemRepository: Send + Sync {
    async fn create(&self, gift_list_id: Uuid, item: CreateGiftItemRequest) -> Result<GiftItem>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<GiftItem>>;
    async fn list_by_gift_list(&self, gift_list_id: Uuid) -> Result<Vec<GiftItem>>;
    async fn update(&self, id: Uuid, update: UpdateGiftItemRequest) -> Result<GiftItem>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait PaymentSessionRepository: Send + Sync {
    async fn create(&self, session: NewPaymentSession) -> Result<PaymentSession>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentSession>>;
    async fn find_by_stripe_session_id(&self, stripe_session_id: &str)
        -> Result<Option<PaymentSession>>;
    /// Conditional Pending -> Paid transition keyed by the Stripe session
    /// id. Returns false when zero rows matched (already paid, or the
    /// session is unknown locally) so duplicate webhook deliveries stay
    /// no-ops.
    async fn mark_paid(
        &self,
        stripe_session_id: &str,
        payment_intent_id: Option<&str>,
    ) -> Result<bool>;
    /// Sum of paid contributions toward a gift item, in whole yen.
    async fn total_contributed(&self, gift_item_id: Uuid) -> Result<i64>;
    async fn has_paid_publish_fee(&self, gift_list_id: Uuid) -> Result<bool>;
}
