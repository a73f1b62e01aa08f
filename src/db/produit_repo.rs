// src/db/produit_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::produit::{NewProduit, Produit, ProduitChanges, ProduitMutation},
};

#[async_trait]
pub trait ProduitStore: Send + Sync {
    async fn create(&self, new: NewProduit) -> Result<Produit, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Produit>, AppError>;

    async fn list(&self) -> Result<Vec<Produit>, AppError>;

    /// `None` se o produto não existe.
    async fn update(
        &self,
        id: Uuid,
        changes: ProduitChanges,
    ) -> Result<Option<ProduitMutation>, AppError>;
}

#[derive(Clone)]
pub struct PgProduitRepository {
    pool: PgPool,
}

impl PgProduitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProduitStore for PgProduitRepository {
    async fn create(&self, new: NewProduit) -> Result<Produit, AppError> {
        sqlx::query_as::<_, Produit>(
            r#"
            INSERT INTO produits (reference, description, qte_stock, unite, prix_unitaire)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new.reference)
        .bind(&new.description)
        .bind(new.qte_stock)
        .bind(&new.unite)
        .bind(new.prix_unitaire)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::ProduitReferenceAlreadyExists(new.reference.clone());
                }
            }
            e.into()
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Produit>, AppError> {
        let produit = sqlx::query_as::<_, Produit>("SELECT * FROM produits WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(produit)
    }

    async fn list(&self) -> Result<Vec<Produit>, AppError> {
        let produits =
            sqlx::query_as::<_, Produit>("SELECT * FROM produits ORDER BY reference ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(produits)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProduitChanges,
    ) -> Result<Option<ProduitMutation>, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava a linha e lê o saldo anterior
        let previous_qte = sqlx::query_scalar::<_, i32>(
            "SELECT qte_stock FROM produits WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous_qte) = previous_qte else {
            return Ok(None);
        };

        // 2. Aplica só os campos enviados
        let produit = sqlx::query_as::<_, Produit>(
            r#"
            UPDATE produits SET
                description = COALESCE($2, description),
                qte_stock = COALESCE($3, qte_stock),
                unite = COALESCE($4, unite),
                prix_unitaire = COALESCE($5, prix_unitaire),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.description)
        .bind(changes.qte_stock)
        .bind(changes.unite)
        .bind(changes.prix_unitaire)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(ProduitMutation { previous_qte, produit }))
    }
}
