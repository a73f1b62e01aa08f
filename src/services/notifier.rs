// src/services/notifier.rs

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Identity, Role},
};

// Nomes dos eventos publicados
pub mod events {
    pub const CONFIRMATION_REQUESTED: &str = "ConfirmationRequested";
    pub const CONFIRMATION_APPROVED: &str = "ConfirmationApproved";
    pub const CONFIRMATION_REJECTED: &str = "ConfirmationRejected";
    pub const STOCK_ALERT: &str = "StockAlert";
    pub const NOTIFICATION_CREATED: &str = "NotificationCreated";
}

// ---
// Canais
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    // Todos os Responsables
    Responsables,
    // Canal privado de um vendeur (decisões)
    Vendeur(Uuid),
    // Canal privado de um usuário (notificações)
    User(Uuid),
}

impl Channel {
    /// Predicado de autorização de assinatura do canal.
    pub fn authorize(&self, identity: &Identity) -> bool {
        match self {
            Channel::Responsables => identity.has_role(Role::Responsable),
            Channel::Vendeur(vendeur_id) => {
                identity.has_role(Role::Vendeur) && identity.vendeur_id == Some(*vendeur_id)
            }
            Channel::User(user_id) => identity.user.id == *user_id,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Responsables => f.write_str("responsables"),
            Channel::Vendeur(id) => write!(f, "vendeur.{}", id),
            Channel::User(id) => write!(f, "user.{}", id),
        }
    }
}

impl FromStr for Channel {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        // Clientes de broadcast costumam prefixar canais privados
        let name = raw
            .strip_prefix("private-")
            .or_else(|| raw.strip_prefix("presence-"))
            .unwrap_or(raw);

        let invalid = || AppError::ResourceNotFound(format!("canal '{}'", raw));

        if name == "responsables" {
            return Ok(Channel::Responsables);
        }
        let (prefix, id) = name.split_once('.').ok_or_else(invalid)?;
        let id = Uuid::parse_str(id).map_err(|_| invalid())?;
        match prefix {
            "vendeur" => Ok(Channel::Vendeur(id)),
            "user" => Ok(Channel::User(id)),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for Channel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// O evento como sai para o transporte
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEvent {
    pub name: String,
    pub channel: Channel,
    pub payload: Value,
}

impl OutboundEvent {
    pub fn new(name: &str, channel: Channel, payload: Value) -> Self {
        Self { name: name.to_string(), channel, payload }
    }
}

/// Interface de publicação. Chamada após cada transição já persistida;
/// o transporte (push, polling, fila) fica a cargo da implementação.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, event: OutboundEvent) -> Result<(), AppError>;
}

// ---
// Implementação de runtime: fila de entrega em broadcast
// ---
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<OutboundEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        self.sender.subscribe()
    }

    /// Consome a fila em segundo plano, registrando cada entrega.
    pub fn spawn_delivery_log(&self) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        tracing::info!(
                            event = %event.name,
                            channel = %event.channel,
                            "📣 Evento entregue"
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("⚠️ Fila de eventos atrasada, {} eventos descartados", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn publish(&self, event: OutboundEvent) -> Result<(), AppError> {
        // Sem assinantes não é erro: o evento simplesmente não tem destino agora.
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            tracing::debug!(event = %event.name, channel = %event.channel, "Nenhum assinante");
        }
        Ok(())
    }
}

// ---
// Implementação que apenas guarda os eventos (testes e execução local)
// ---
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<OutboundEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn events_named(&self, name: &str) -> Vec<OutboundEvent> {
        self.events().into_iter().filter(|e| e.name == name).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, event: OutboundEvent) -> Result<(), AppError> {
        self.events
            .lock()
            .map_err(|_| anyhow::anyhow!("RecordingNotifier envenenado"))?
            .push(event);
        Ok(())
    }
}
