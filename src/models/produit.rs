// src/models/produit.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

// --- Produto do catálogo, com o saldo de estoque embutido ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Produit {
    pub id: Uuid,
    #[schema(example = "PRD-0042")]
    pub reference: String,
    #[schema(example = "Ciment CPJ 45 - sac 50kg")]
    pub description: String,
    #[schema(example = 5)]
    pub qte_stock: i32,
    #[schema(example = "sac")]
    pub unite: String,
    #[schema(example = "4500.00")]
    pub prix_unitaire: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduit {
    pub reference: String,
    pub description: String,
    pub qte_stock: i32,
    pub unite: String,
    pub prix_unitaire: Decimal,
}

// Campos ausentes ficam como estão
#[derive(Debug, Clone, Default)]
pub struct ProduitChanges {
    pub description: Option<String>,
    pub qte_stock: Option<i32>,
    pub unite: Option<String>,
    pub prix_unitaire: Option<Decimal>,
}

// Resultado de um UPDATE: o saldo anterior + o produto atualizado
#[derive(Debug, Clone)]
pub struct ProduitMutation {
    pub previous_qte: i32,
    pub produit: Produit,
}
