use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, Row, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{NewPaymentSession, PaymentKind, PaymentSession, SessionStatus, Subject},
    error::{AppError, Result},
    repository::PaymentSessionRepository,
};

#[derive(FromRow)]
struct PaymentSessionRow {
    id: String,
    stripe_session_id: String,
    stripe_payment_intent_id: Option<String>,
    kind: String,
    amount: i64,
    currency: String,
    status: String,
    gift_list_id: Option<String>,
    gift_item_id: Option<String>,
    user_id: Option<String>,
    completed_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqlitePaymentSessionRepository {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, stripe_session_id, stripe_payment_intent_id, kind, amount,
           currency, status, gift_list_id, gift_item_id, user_id,
           completed_at, created_at, updated_at
    FROM payment_sessions
"#;

impl SqlitePaymentSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_session(row: PaymentSessionRow) -> Result<PaymentSession> {
        let kind = Self::parse_kind(&row.kind)?;
        let subject = Self::subject_from_columns(
            kind,
            row.gift_list_id.as_deref(),
            row.gift_item_id.as_deref(),
            row.user_id.as_deref(),
        )?;

        Ok(PaymentSession {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            stripe_session_id: row.stripe_session_id,
            stripe_payment_intent_id: row.stripe_payment_intent_id,
            kind,
            amount: row.amount,
            currency: row.currency,
            status: Self::parse_status(&row.status)?,
            subject,
            completed_at: row
                .completed_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_kind(s: &str) -> Result<PaymentKind> {
        match s {
            "PublishFee" => Ok(PaymentKind::PublishFee),
            "SupportContribution" => Ok(PaymentKind::SupportContribution),
            "Onboarding" => Ok(PaymentKind::Onboarding),
            _ => Err(AppError::Database(format!("Invalid payment kind: {}", s))),
        }
    }

    fn kind_to_str(kind: PaymentKind) -> &'static str {
        match kind {
            PaymentKind::PublishFee => "PublishFee",
            PaymentKind::SupportContribution => "SupportContribution",
            PaymentKind::Onboarding => "Onboarding",
        }
    }

    fn parse_status(s: &str) -> Result<SessionStatus> {
        match s {
            "Pending" => Ok(SessionStatus::Pending),
            "Paid" => Ok(SessionStatus::Paid),
            _ => Err(AppError::Database(format!("Invalid session status: {}", s))),
        }
    }

    fn status_to_str(status: SessionStatus) -> &'static str {
        match status {
            SessionStatus::Pending => "Pending",
            SessionStatus::Paid => "Paid",
        }
    }

    fn subject_from_columns(
        kind: PaymentKind,
        gift_list_id: Option<&str>,
        gift_item_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Subject> {
        let parse = |s: &str| Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()));
        match kind {
            PaymentKind::PublishFee => gift_list_id
                .map(parse)
                .transpose()?
                .map(Subject::GiftList)
                .ok_or_else(|| AppError::Database("PublishFee session missing gift_list_id".to_string())),
            PaymentKind::SupportContribution => gift_item_id
                .map(parse)
                .transpose()?
                .map(Subject::GiftItem)
                .ok_or_else(|| {
                    AppError::Database("SupportContribution session missing gift_item_id".to_string())
                }),
            PaymentKind::Onboarding => user_id
                .map(parse)
                .transpose()?
                .map(Subject::User)
                .ok_or_else(|| AppError::Database("Onboarding session missing user_id".to_string())),
        }
    }

    fn subject_columns(subject: Subject) -> (Option<String>, Option<String>, Option<String>) {
        match subject {
            Subject::GiftList(id) => (Some(id.to_string()), None, None),
            Subject::GiftItem(id) => (None, Some(id.to_string()), None),
            Subject::User(id) => (None, None, Some(id.to_string())),
        }
    }
}

#[async_trait]
impl PaymentSessionRepository for SqlitePaymentSessionRepository {
    async fn create(&self, session: NewPaymentSession) -> Result<PaymentSession> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let kind_str = Self::kind_to_str(session.kind);
        let status_str = Self::status_to_str(SessionStatus::Pending);
        let (gift_list_id, gift_item_id, user_id) = Self::subject_columns(session.subject);
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payment_sessions (
                id, stripe_session_id, stripe_payment_intent_id, kind, amount,
                currency, status, gift_list_id, gift_item_id, user_id,
                completed_at, created_at, updated_at
            ) VALUES (?, ?, NULL, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&session.stripe_session_id)
        .bind(kind_str)
        .bind(session.amount)
        .bind(&session.currency)
        .bind(status_str)
        .bind(&gift_list_id)
        .bind(&gift_item_id)
        .bind(&user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created payment session".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentSession>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, PaymentSessionRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id_str)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_session(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_stripe_session_id(
        &self,
        stripe_session_id: &str,
    ) -> Result<Option<PaymentSession>> {
        let row = sqlx::query_as::<_, PaymentSessionRow>(&format!(
            "{SELECT_COLUMNS} WHERE stripe_session_id = ?"
        ))
        .bind(stripe_session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_session(r)?)),
            None => Ok(None),
        }
    }

    async fn mark_paid(
        &self,
        stripe_session_id: &str,
        payment_intent_id: Option<&str>,
    ) -> Result<bool> {
        let now = Utc::now().naive_utc();

        // The status filter makes the transition idempotent: a second
        // delivery (or a concurrent one) matches zero rows.
        let result = sqlx::query(
            r#"
            UPDATE payment_sessions
            SET status = ?,
                stripe_payment_intent_id = ?,
                completed_at = ?,
                updated_at = ?
            WHERE stripe_session_id = ? AND status = ?
            "#,
        )
        .bind(Self::status_to_str(SessionStatus::Paid))
        .bind(payment_intent_id)
        .bind(now)
        .bind(now)
        .bind(stripe_session_id)
        .bind(Self::status_to_str(SessionStatus::Pending))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn total_contributed(&self, gift_item_id: Uuid) -> Result<i64> {
        let gift_item_id_str = gift_item_id.to_string();
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS total
            FROM payment_sessions
            WHERE gift_item_id = ? AND status = ?
            "#,
        )
        .bind(gift_item_id_str)
        .bind(Self::status_to_str(SessionStatus::Paid))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.try_get::<i64, _>("total")
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn has_paid_publish_fee(&self, gift_list_id: Uuid) -> Result<bool> {
        let gift_list_id_str = gift_list_id.to_string();
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS paid_count
            FROM payment_sessions
            WHERE gift_list_id = ? AND kind = ? AND status = ?
            "#,
        )
        .bind(gift_list_id_str)
        .bind(Self::kind_to_str(PaymentKind::PublishFee))
        .bind(Self::status_to_str(SessionStatus::Paid))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let count: i64 = row
            .try_get("paid_count")
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }
}
