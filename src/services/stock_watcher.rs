// src/services/stock_watcher.rs

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    common::{
        error::AppError,
        i18n::{I18nStore, DEFAULT_LANG},
    },
    db::{DirectoryStore, NotificationStore, Stores},
    models::{
        auth::Role,
        notification::{Notification, NotificationKind, StockAlertPayload, StockAlertType},
        produit::Produit,
    },
    services::notifier::{events, Channel, Notifier, OutboundEvent},
};

pub const DEFAULT_THRESHOLD: i32 = 10;
pub const DEFAULT_WINDOW_MINUTES: i64 = 60;

/// `None` acima do limite; `OutOfStock` em zero ou negativo.
pub fn classify(quantity: i32, threshold: i32) -> Option<StockAlertType> {
    if quantity <= 0 {
        Some(StockAlertType::OutOfStock)
    } else if quantity <= threshold {
        Some(StockAlertType::LowStock)
    } else {
        None
    }
}

// O que aconteceu com o saldo do produto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityMutation {
    Created,
    Updated { previous: i32 },
}

#[derive(Clone)]
pub struct StockWatcher {
    directory: Arc<dyn DirectoryStore>,
    notifications: Arc<dyn NotificationStore>,
    notifier: Arc<dyn Notifier>,
    i18n: Arc<I18nStore>,
    threshold: i32,
    window: Duration,
}

impl StockWatcher {
    pub fn new(
        stores: &Stores,
        notifier: Arc<dyn Notifier>,
        i18n: Arc<I18nStore>,
        threshold: i32,
        window: Duration,
    ) -> Self {
        Self {
            directory: stores.directory.clone(),
            notifications: stores.notifications.clone(),
            notifier,
            i18n,
            threshold,
            window,
        }
    }

    /// Observa uma mutação de produto e avisa os Responsables se o saldo
    /// estiver baixo. Devolve quantas notificações foram gravadas.
    pub async fn observe(
        &self,
        produit: &Produit,
        mutation: QuantityMutation,
    ) -> Result<usize, AppError> {
        // 1. Só criação ou mudança efetiva de quantidade interessa
        if let QuantityMutation::Updated { previous } = mutation {
            if previous == produit.qte_stock {
                return Ok(0);
            }
        }

        let Some(alert_type) = classify(produit.qte_stock, self.threshold) else {
            return Ok(0);
        };

        // 2. Supressão global: um alerta não lido recente vale para todos
        let since = Utc::now() - self.window;
        let already_alerted = self
            .notifications
            .exists_unread_since(
                NotificationKind::StockAlert,
                "produit_id",
                &produit.id.to_string(),
                since,
            )
            .await?;
        if already_alerted {
            tracing::debug!(produit_id = %produit.id, "Alerta de estoque suprimido (janela ativa)");
            return Ok(0);
        }

        // 3. Payload comum a todos os alertas
        let payload = self.build_payload(produit, alert_type);
        let data = serde_json::to_value(&payload)
            .map_err(|e| anyhow::anyhow!("Falha ao serializar StockAlert: {}", e))?;

        // Todos os Responsables num lote só: ou todos recebem, ou ninguém
        let responsables = self.directory.user_ids_with_role(Role::Responsable).await?;
        let batch = responsables
            .into_iter()
            .map(|user_id| Notification::new(user_id, NotificationKind::StockAlert, data.clone()))
            .collect();
        let saved = self.notifications.insert_many(batch).await?;
        let created = saved.len();

        // 4. Eventos só depois do lote gravado
        for notification in saved {
            let channel = Channel::User(notification.user_id);
            self.publish(OutboundEvent::new(events::STOCK_ALERT, channel, data.clone()))
                .await;
            match serde_json::to_value(&notification) {
                Ok(value) => {
                    self.publish(OutboundEvent::new(events::NOTIFICATION_CREATED, channel, value))
                        .await
                }
                Err(e) => tracing::error!("🔥 Falha ao serializar notificação: {}", e),
            }
        }

        tracing::info!(
            produit_id = %produit.id,
            reference = %produit.reference,
            qte_stock = produit.qte_stock,
            alert = ?alert_type,
            "📦 Alerta de estoque enviado a {} responsable(s)",
            created
        );
        Ok(created)
    }

    fn build_payload(&self, produit: &Produit, alert_type: StockAlertType) -> StockAlertPayload {
        let quantity = produit.qte_stock.to_string();
        let args = [
            ("reference", produit.reference.as_str()),
            ("quantity", quantity.as_str()),
            ("unite", produit.unite.as_str()),
        ];
        let (title_key, message_key) = match alert_type {
            StockAlertType::LowStock => ("stock.low.title", "stock.low.message"),
            StockAlertType::OutOfStock => ("stock.out.title", "stock.out.message"),
        };

        StockAlertPayload {
            alert_type,
            title: self.i18n.translate(DEFAULT_LANG, title_key),
            message: self.i18n.translate_with(DEFAULT_LANG, message_key, &args),
            produit_id: produit.id,
            produit_reference: produit.reference.clone(),
            produit_description: produit.description.clone(),
            stock_actuel: produit.qte_stock,
            unite: produit.unite.clone(),
            threshold: self.threshold,
            action_url: format!("/produits/{}", produit.id),
        }
    }

    async fn publish(&self, event: OutboundEvent) {
        let (name, channel) = (event.name.clone(), event.channel);
        if let Err(e) = self.notifier.publish(event).await {
            tracing::warn!(event = %name, %channel, "⚠️ Falha ao publicar evento: {}", e);
        }
    }
}
