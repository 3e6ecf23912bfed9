use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreateGiftItemRequest, GiftItem, UpdateGiftItemRequest},
    error::{AppError, Result},
    repository::GiftItemRepository,
};

#[derive(FromRow)]
struct GiftItemRow {
    id: String,
    gift_list_id: String,
    name: String,
    description: Option<String>,
    target_amount: Option<i64>,
    product_url: Option<String>,
    image_url: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteGiftItemRepository {
    pool: SqlitePool,
}

impl SqliteGiftItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_gift_item(row: GiftItemRow) -> Result<GiftItem> {
        Ok(GiftItem {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            gift_list_id: Uuid::parse_str(&row.gift_list_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            description: row.description,
            target_amount: row.target_amount,
            product_url: row.product_url,
            image_url: row.image_url,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl GiftItemRepository for SqliteGiftItemRepository {
    async fn create(&self, gift_list_id: Uuid, item: CreateGiftItemRequest) -> Result<GiftItem> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let gift_list_id_str = gift_list_id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO gift_items (
                id, gift_list_id, name, description, target_amount,
                product_url, image_url, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&gift_list_id_str)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.target_amount)
        .bind(&item.product_url)
        .bind(&item.image_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created gift item".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GiftItem>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, GiftItemRow>(
            r#"
            SELECT id, gift_list_id, name, description, target_amount,
                   product_url, image_url, created_at, updated_at
            FROM gift_items
            WHERE id = ?
            "#,
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_gift_item(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_gift_list(&self, gift_list_id: Uuid) -> Result<Vec<GiftItem>> {
        let gift_list_id_str = gift_list_id.to_string();
        let rows = sqlx::query_as::<_, GiftItemRow>(
            r#"
            SELECT id, gift_list_id, name, description, target_amount,
                   product_url, image_url, created_at, updated_at
            FROM gift_items
            WHERE gift_list_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(gift_list_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_gift_item).collect()
    }

    async fn update(&self, id: Uuid, update: UpdateGiftItemRequest) -> Result<GiftItem> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift item not found".to_string()))?;

        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE gift_items
            SET name = ?,
                description = ?,
                target_amount = ?,
                product_url = ?,
                image_url = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.name.unwrap_or(existing.name))
        .bind(update.description.or(existing.description))
        .bind(update.target_amount.or(existing.target_amount))
        .bind(update.product_url.or(existing.product_url))
        .bind(update.image_url.or(existing.image_url))
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated gift item".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        sqlx::query("DELETE FROM gift_items WHERE id = ?")
            .bind(id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
