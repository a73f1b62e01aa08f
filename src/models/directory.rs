// src/models/directory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

// ---
// 1. Vendeur (o vendedor que precisa de um Employee para trabalhar)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vendeur {
    pub id: Uuid,
    // Vínculo com a conta de login (pode não existir)
    pub user_id: Option<Uuid>,
    #[schema(example = "Ndiaye")]
    pub nom: String,
    #[schema(example = "Moussa")]
    pub prenom: String,
    #[schema(example = "+221 77 000 00 00")]
    pub telephone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Vendeur {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

// ---
// 2. Employee
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    #[schema(example = "Sarr")]
    pub nom: String,
    #[schema(example = "Fatou")]
    pub prenom: String,
    pub telephone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}
