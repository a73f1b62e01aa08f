// src/db/notification_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notification::{Notification, NotificationKind},
};

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<Notification, AppError>;

    /// Grava o lote inteiro ou nada.
    async fn insert_many(
        &self,
        notifications: Vec<Notification>,
    ) -> Result<Vec<Notification>, AppError>;

    /// Existe notificação NÃO lida deste `kind`, criada a partir de `since`,
    /// cujo payload tenha `data[field] == value`?
    async fn exists_unread_since(
        &self,
        kind: NotificationKind,
        field: &str,
        value: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError>;

    /// `false` se a notificação não existe para este usuário.
    async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64, AppError>;

    async fn count_unread(&self, user_id: Uuid) -> Result<i64, AppError>;
}

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<Notification, AppError> {
        let saved = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, kind, data, read_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind)
        .bind(&notification.data)
        .bind(notification.read_at)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn insert_many(
        &self,
        notifications: Vec<Notification>,
    ) -> Result<Vec<Notification>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(notifications.len());
        for notification in notifications {
            let row = sqlx::query_as::<_, Notification>(
                r#"
                INSERT INTO notifications (id, user_id, kind, data, read_at, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(notification.id)
            .bind(notification.user_id)
            .bind(notification.kind)
            .bind(&notification.data)
            .bind(notification.read_at)
            .bind(notification.created_at)
            .fetch_one(&mut *tx)
            .await?;
            saved.push(row);
        }
        tx.commit().await?;
        Ok(saved)
    }

    async fn exists_unread_since(
        &self,
        kind: NotificationKind,
        field: &str,
        value: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM notifications
                WHERE kind = $1
                  AND read_at IS NULL
                  AND created_at >= $2
                  AND data ->> $3 = $4
            )
            "#,
        )
        .bind(kind)
        .bind(since)
        .bind(field)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read_at IS NULL)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        // COALESCE mantém a primeira data de leitura
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, $3)
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = $2 WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
