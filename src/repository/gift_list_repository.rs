use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{GiftList, UpdateGiftListRequest},
    error::{AppError, Result},
    repository::GiftListRepository,
};

#[derive(FromRow)]
struct GiftListRow {
    id: String,
    couple_id: String,
    title: String,
    description: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteGiftListRepository {
    pool: SqlitePool,
}

impl SqliteGiftListRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_gift_list(row: GiftListRow) -> Result<GiftList> {
        Ok(GiftList {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            couple_id: Uuid::parse_str(&row.couple_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            description: row.description,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl GiftListRepository for SqliteGiftListRepository {
    async fn create(&self, couple_id: Uuid, title: &str, description: &str) -> Result<GiftList> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let couple_id_str = couple_id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO gift_lists (id, couple_id, title, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&couple_id_str)
        .bind(title)
        .bind(description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created gift list".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GiftList>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, GiftListRow>(
            r#"
            SELECT id, couple_id, title, description, created_at, updated_at
            FROM gift_lists
            WHERE id = ?
            "#,
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_gift_list(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_couple(&self, couple_id: Uuid) -> Result<Vec<GiftList>> {
        let couple_id_str = couple_id.to_string();
        let rows = sqlx::query_as::<_, GiftListRow>(
            r#"
            SELECT id, couple_id, title, description, created_at, updated_at
            FROM gift_lists
            WHERE couple_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(couple_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_gift_list).collect()
    }

    async fn update(&self, id: Uuid, update: UpdateGiftListRequest) -> Result<GiftList> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift list not found".to_string()))?;

        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE gift_lists
            SET title = ?, description = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.title.unwrap_or(existing.title))
        .bind(update.description.unwrap_or(existing.description))
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated gift list".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        sqlx::query("DELETE FROM gift_lists WHERE id = ?")
            .bind(id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
