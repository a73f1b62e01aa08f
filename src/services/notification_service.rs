// src/services/notification_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{NotificationStore, Stores},
    models::notification::Notification,
};

// Caixa de entrada do usuário autenticado
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(stores: &Stores) -> Self {
        Self { notifications: stores.notifications.clone() }
    }

    pub async fn list(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>, AppError> {
        self.notifications.list_for_user(user_id, unread_only).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.notifications.count_unread(user_id).await
    }

    /// Notificações de outro usuário contam como inexistentes.
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), AppError> {
        if self.notifications.mark_read(user_id, notification_id, Utc::now()).await? {
            Ok(())
        } else {
            Err(AppError::ResourceNotFound(format!("notification {}", notification_id)))
        }
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let updated = self.notifications.mark_all_read(user_id, Utc::now()).await?;
        tracing::debug!(%user_id, updated, "Notificações marcadas como lidas");
        Ok(updated)
    }
}
