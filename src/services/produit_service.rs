// src/services/produit_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ProduitStore, Stores},
    models::produit::{NewProduit, Produit, ProduitChanges},
    services::stock_watcher::{QuantityMutation, StockWatcher},
};

#[derive(Clone)]
pub struct ProduitService {
    produits: Arc<dyn ProduitStore>,
    watcher: StockWatcher,
}

impl ProduitService {
    pub fn new(stores: &Stores, watcher: StockWatcher) -> Self {
        Self { produits: stores.produits.clone(), watcher }
    }

    pub async fn create(&self, new: NewProduit) -> Result<Produit, AppError> {
        let produit = self.produits.create(new).await?;
        tracing::info!(produit_id = %produit.id, reference = %produit.reference, "🆕 Produto criado");

        self.watch(&produit, QuantityMutation::Created).await;
        Ok(produit)
    }

    pub async fn update(&self, id: Uuid, changes: ProduitChanges) -> Result<Produit, AppError> {
        let mutation = self
            .produits
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("produit {}", id)))?;

        self.watch(
            &mutation.produit,
            QuantityMutation::Updated { previous: mutation.previous_qte },
        )
        .await;
        Ok(mutation.produit)
    }

    pub async fn get(&self, id: Uuid) -> Result<Produit, AppError> {
        self.produits
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("produit {}", id)))
    }

    pub async fn list(&self) -> Result<Vec<Produit>, AppError> {
        self.produits.list().await
    }

    // O produto já foi gravado: falha no alerta não desfaz a mutação
    async fn watch(&self, produit: &Produit, mutation: QuantityMutation) {
        if let Err(e) = self.watcher.observe(produit, mutation).await {
            tracing::warn!(produit_id = %produit.id, "⚠️ Falha no alerta de estoque: {}", e);
        }
    }
}
