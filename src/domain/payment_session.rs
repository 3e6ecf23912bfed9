use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per checkout attempt against Stripe. Retried checkouts create
/// new sessions; rows are never reused or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub id: Uuid,
    /// Stripe checkout session id; unique, immutable, and the correlation
    /// key the webhook reconciles on.
    pub stripe_session_id: String,
    /// Set exactly once, when the payment settles.
    pub stripe_payment_intent_id: Option<String>,
    pub kind: PaymentKind,
    /// Whole yen. JPY is a zero-decimal currency in Stripe.
    pub amount: i64,
    pub currency: String,
    pub status: SessionStatus,
    pub subject: Subject,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    PublishFee,
    SupportContribution,
    Onboarding,
}

impl PaymentKind {
    /// Wire spelling, also used as the `kind` metadata value on the
    /// Stripe session.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::PublishFee => "publish_fee",
            PaymentKind::SupportContribution => "support_contribution",
            PaymentKind::Onboarding => "onboarding",
        }
    }
}

/// Monotonic: Pending -> Paid, nothing else. Abandoned checkouts stay
/// Pending; Stripe expires the hosted session on its side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Paid,
}

/// The entity a session bills for, keyed by kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Subject {
    GiftList(Uuid),
    GiftItem(Uuid),
    User(Uuid),
}

impl Subject {
    pub fn id(&self) -> Uuid {
        match self {
            Subject::GiftList(id) | Subject::GiftItem(id) | Subject::User(id) => *id,
        }
    }

    /// Metadata key the subject id travels under on the Stripe session.
    pub fn metadata_key(&self) -> &'static str {
        match self {
            Subject::GiftList(_) => "gift_list_id",
            Subject::GiftItem(_) => "gift_item_id",
            Subject::User(_) => "user_id",
        }
    }

    pub fn matches_kind(&self, kind: PaymentKind) -> bool {
        matches!(
            (self, kind),
            (Subject::GiftList(_), PaymentKind::PublishFee)
                | (Subject::GiftItem(_), PaymentKind::SupportContribution)
                | (Subject::User(_), PaymentKind::Onboarding)
        )
    }
}

/// What the initiator persists right after Stripe hands back a session.
#[derive(Debug, Clone)]
pub struct NewPaymentSession {
    pub stripe_session_id: String,
    pub kind: PaymentKind,
    pub amount: i64,
    pub currency: String,
    pub subject: Subject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_pairs_with_its_kind_only() {
        let id = Uuid::new_v4();
        assert!(Subject::GiftList(id).matches_kind(PaymentKind::PublishFee));
        assert!(Subject::GiftItem(id).matches_kind(PaymentKind::SupportContribution));
        assert!(Subject::User(id).matches_kind(PaymentKind::Onboarding));
        assert!(!Subject::GiftList(id).matches_kind(PaymentKind::SupportContribution));
        assert!(!Subject::User(id).matches_kind(PaymentKind::PublishFee));
    }

    #[test]
    fn metadata_keys_follow_subject() {
        let id = Uuid::new_v4();
        assert_eq!(Subject::GiftList(id).metadata_key(), "gift_list_id");
        assert_eq!(Subject::GiftItem(id).metadata_key(), "gift_item_id");
        assert_eq!(Subject::User(id).metadata_key(), "user_id");
    }
}
