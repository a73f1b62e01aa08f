// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::models::confirmation::{ConfirmationStatus, RequesterType};

// Uma única tabela para todos os alertas: o 'kind' diz de qual domínio veio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ConfirmationRequested,
    ConfirmationDecided,
    StockAlert,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    // Destinatário
    pub user_id: Uuid,
    pub kind: NotificationKind,
    #[schema(value_type = Object)]
    pub data: Value,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: Uuid, kind: NotificationKind, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            data,
            read_at: None,
            created_at: Utc::now(),
        }
    }
}

// ---
// Contratos de payload dos eventos (nomes de campo em snake_case, fixos)
// ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationRequestedPayload {
    pub confirmation_id: Uuid,
    pub vendeur_id: Uuid,
    pub employee_id: Uuid,
    pub vendeur_name: String,
    pub employee_name: String,
    pub requester_type: RequesterType,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySnapshot {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproverSnapshot {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    pub id: Uuid,
    pub vendeur_id: Uuid,
    pub employee_id: Uuid,
    pub status: ConfirmationStatus,
    pub requester_type: RequesterType,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub vendeur: Option<PartySnapshot>,
    pub employee: Option<PartySnapshot>,
    pub approver: Option<ApproverSnapshot>,
}

// ConfirmationApproved / ConfirmationRejected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationDecisionPayload {
    pub confirmation: ConfirmationRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockAlertType {
    LowStock,
    OutOfStock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAlertPayload {
    #[serde(rename = "type")]
    pub alert_type: StockAlertType,
    pub title: String,
    pub message: String,
    pub produit_id: Uuid,
    pub produit_reference: String,
    pub produit_description: String,
    pub stock_actuel: i32,
    pub unite: String,
    pub threshold: i32,
    pub action_url: String,
}

// Contagem de não lidas
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread: i64,
}
