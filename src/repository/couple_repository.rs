use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CoupleProfile, CreateCoupleProfileRequest, UpdateCoupleProfileRequest},
    error::{AppError, Result},
    repository::CoupleRepository,
};

#[derive(FromRow)]
struct CoupleRow {
    id: String,
    user_id: String,
    slug: String,
    partner_one_name: String,
    partner_two_name: String,
    wedding_date: Option<NaiveDate>,
    greeting: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteCoupleRepository {
    pool: SqlitePool,
}

impl SqliteCoupleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_couple(row: CoupleRow) -> Result<CoupleProfile> {
        Ok(CoupleProfile {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            slug: row.slug,
            partner_one_name: row.partner_one_name,
            partner_two_name: row.partner_two_name,
            wedding_date: row.wedding_date,
            greeting: row.greeting,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, slug, partner_one_name, partner_two_name,
           wedding_date, greeting, created_at, updated_at
    FROM couple_profiles
"#;

#[async_trait]
impl CoupleRepository for SqliteCoupleRepository {
    async fn create(
        &self,
        couple: CreateCoupleProfileRequest,
        slug: String,
    ) -> Result<CoupleProfile> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let user_id_str = couple.user_id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO couple_profiles (
                id, user_id, slug, partner_one_name, partner_two_name,
                wedding_date, greeting, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&user_id_str)
        .bind(&slug)
        .bind(&couple.partner_one_name)
        .bind(&couple.partner_two_name)
        .bind(couple.wedding_date)
        .bind(&couple.greeting)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created couple profile".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CoupleProfile>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, CoupleRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id_str)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_couple(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CoupleProfile>> {
        let row = sqlx::query_as::<_, CoupleRow>(&format!("{SELECT_COLUMNS} WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_couple(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<CoupleProfile>> {
        let user_id_str = user_id.to_string();
        let row = sqlx::query_as::<_, CoupleRow>(&format!("{SELECT_COLUMNS} WHERE user_id = ?"))
            .bind(user_id_str)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_couple(r)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, update: UpdateCoupleProfileRequest) -> Result<CoupleProfile> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Couple profile not found".to_string()))?;

        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE couple_profiles
            SET partner_one_name = ?,
                partner_two_name = ?,
                wedding_date = ?,
                greeting = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.partner_one_name.unwrap_or(existing.partner_one_name))
        .bind(update.partner_two_name.unwrap_or(existing.partner_two_name))
        .bind(update.wedding_date.or(existing.wedding_date))
        .bind(update.greeting.or(existing.greeting))
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated couple profile".to_string()))
    }
}
