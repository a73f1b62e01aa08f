// src/models/confirmation.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::models::{
    auth::User,
    directory::{Employee, Vendeur},
};

// --- Enums ---

// Mapeia o CREATE TYPE confirmation_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "confirmation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ConfirmationStatus {
    /// `approved` e `rejected` não têm transição de saída.
    pub fn is_terminal(self) -> bool {
        match self {
            ConfirmationStatus::Pending => false,
            ConfirmationStatus::Approved | ConfirmationStatus::Rejected => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmationStatus::Pending => "pending",
            ConfirmationStatus::Approved => "approved",
            ConfirmationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Qual lado do par iniciou o pedido
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "requester_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequesterType {
    Vendeur,
    Employee,
}

// --- O registro persistido ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub id: Uuid,
    pub vendeur_id: Uuid,
    pub employee_id: Uuid,
    pub status: ConfirmationStatus,
    pub requester_type: RequesterType,
    pub requested_by: Uuid,
    // Preenchidos juntos, uma única vez, na saída de 'pending'
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Dados para inserir um novo pedido (sempre nasce 'pending')
#[derive(Debug, Clone)]
pub struct NewConfirmation {
    pub vendeur_id: Uuid,
    pub employee_id: Uuid,
    pub requester_type: RequesterType,
    pub requested_by: Uuid,
}

// Resposta completa (Pedido + partes resolvidas)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationDetail {
    #[serde(flatten)]
    pub confirmation: Confirmation,
    pub vendeur: Option<Vendeur>,
    pub employee: Option<Employee>,
    pub approver: Option<User>,
}
