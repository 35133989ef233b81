//! Repository for the owned collections (properties, sales, purchases, users).

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;
use estatehub_entity::resource::{ResourceKind, ResourcePayload, ResourceRecord, UNOWNED};
use estatehub_entity::{Property, Purchase, Sale, User};

use super::map_db_error;
use crate::store::ResourceStore;

/// Table-driven CRUD over every [`ResourceKind`].
#[derive(Debug, Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    /// Create a new resource repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional_as<T>(&self, sql: &str, id: i64) -> AppResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to fetch record"))
    }

    async fn fetch_all_as<T>(&self, sql: &str, owner: Option<i64>) -> AppResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut query = sqlx::query_as::<_, T>(sql);
        if let Some(owner) = owner {
            query = query.bind(owner);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to list records"))
    }

    async fn write_as<T>(
        &self,
        sql: &str,
        payload: &ResourcePayload,
        trailing: i64,
    ) -> AppResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        payload
            .bind(sqlx::query_as::<_, T>(sql))
            .bind(trailing)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to write record"))
    }

    async fn fetch_records(&self, kind: ResourceKind, owner: Option<i64>) -> AppResult<Vec<ResourceRecord>> {
        let sql = match owner {
            Some(_) => format!(
                "SELECT * FROM {} WHERE {} = $1 ORDER BY id DESC",
                kind.table(),
                kind.owner_column()
            ),
            None => format!("SELECT * FROM {} ORDER BY id DESC", kind.table()),
        };

        Ok(match kind {
            ResourceKind::Property => self
                .fetch_all_as::<Property>(&sql, owner)
                .await?
                .into_iter()
                .map(ResourceRecord::Property)
                .collect(),
            ResourceKind::Sale => self
                .fetch_all_as::<Sale>(&sql, owner)
                .await?
                .into_iter()
                .map(ResourceRecord::Sale)
                .collect(),
            ResourceKind::Purchase => self
                .fetch_all_as::<Purchase>(&sql, owner)
                .await?
                .into_iter()
                .map(ResourceRecord::Purchase)
                .collect(),
            ResourceKind::User => self
                .fetch_all_as::<User>(&sql, owner)
                .await?
                .into_iter()
                .map(ResourceRecord::User)
                .collect(),
        })
    }

    /// Delete an account in one transaction, releasing the records it owned.
    ///
    /// `Conflict` while a sale or purchase still names the account.
    async fn delete_account(&self, id: i64) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to start transaction"))?;

        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM sales WHERE buyer_id = $1) \
             OR EXISTS (SELECT 1 FROM purchases WHERE seller_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error("Failed to check account references"))?;
        if referenced {
            return Err(AppError::conflict(format!(
                "User {id} is still a sale buyer or purchase seller"
            )));
        }

        for kind in [ResourceKind::Property, ResourceKind::Sale, ResourceKind::Purchase] {
            let sql = format!(
                "UPDATE {} SET owner_id = $1 WHERE owner_id = $2",
                kind.table()
            );
            sqlx::query(&sql)
                .bind(UNOWNED)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error("Failed to release owned records"))?;
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error("Failed to delete account"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("users record {id} not found")));
        }

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit account deletion"))
    }

    async fn write(
        &self,
        sql: &str,
        payload: &ResourcePayload,
        trailing: i64,
    ) -> AppResult<Option<ResourceRecord>> {
        Ok(match payload.kind() {
            ResourceKind::Property => self
                .write_as::<Property>(sql, payload, trailing)
                .await?
                .map(ResourceRecord::Property),
            ResourceKind::Sale => self
                .write_as::<Sale>(sql, payload, trailing)
                .await?
                .map(ResourceRecord::Sale),
            ResourceKind::Purchase => self
                .write_as::<Purchase>(sql, payload, trailing)
                .await?
                .map(ResourceRecord::Purchase),
            ResourceKind::User => self
                .write_as::<User>(sql, payload, trailing)
                .await?
                .map(ResourceRecord::User),
        })
    }
}

#[async_trait]
impl ResourceStore for ResourceRepository {
    async fn get_owner_id(&self, kind: ResourceKind, id: i64) -> AppResult<i64> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            kind.owner_column(),
            kind.table()
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to look up owner"))?
            .ok_or_else(|| AppError::not_found(format!("{kind} record {id} not found")))
    }

    async fn list(&self, kind: ResourceKind) -> AppResult<Vec<ResourceRecord>> {
        self.fetch_records(kind, None).await
    }

    async fn list_owned(&self, kind: ResourceKind, owner_id: i64) -> AppResult<Vec<ResourceRecord>> {
        self.fetch_records(kind, Some(owner_id)).await
    }

    async fn find(&self, kind: ResourceKind, id: i64) -> AppResult<ResourceRecord> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", kind.table());
        let record = match kind {
            ResourceKind::Property => self
                .fetch_optional_as::<Property>(&sql, id)
                .await?
                .map(ResourceRecord::Property),
            ResourceKind::Sale => self
                .fetch_optional_as::<Sale>(&sql, id)
                .await?
                .map(ResourceRecord::Sale),
            ResourceKind::Purchase => self
                .fetch_optional_as::<Purchase>(&sql, id)
                .await?
                .map(ResourceRecord::Purchase),
            ResourceKind::User => self
                .fetch_optional_as::<User>(&sql, id)
                .await?
                .map(ResourceRecord::User),
        };
        record.ok_or_else(|| AppError::not_found(format!("{kind} record {id} not found")))
    }

    async fn insert(&self, payload: &ResourcePayload, owner_id: i64) -> AppResult<ResourceRecord> {
        let kind = payload.kind();
        if !kind.supports_insert() {
            return Err(AppError::validation(format!(
                "{kind} cannot be created through this endpoint"
            )));
        }

        self.write(&kind.insert_sql(), payload, owner_id)
            .await?
            .ok_or_else(|| AppError::internal(format!("Insert into {kind} returned no row")))
    }

    async fn update(&self, id: i64, payload: &ResourcePayload) -> AppResult<ResourceRecord> {
        let kind = payload.kind();
        self.write(&kind.update_sql(), payload, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{kind} record {id} not found")))
    }

    async fn delete(&self, kind: ResourceKind, id: i64) -> AppResult<()> {
        if kind == ResourceKind::User {
            return self.delete_account(id).await;
        }

        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error("Failed to delete record"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("{kind} record {id} not found")));
        }
        Ok(())
    }
}
