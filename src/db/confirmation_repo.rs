// src/db/confirmation_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        confirmation::{Confirmation, ConfirmationStatus, NewConfirmation},
        session::WorkSession,
    },
};

/// Persistência dos pedidos de confirmação.
///
/// Implementações devem garantir atomicamente:
/// - no máximo um `pending` por vendeur (`insert_pending` falha com `DuplicatePending`);
/// - a decisão só acontece se o status ainda for `pending` (compare-and-set);
/// - a aprovação e a sessão de trabalho do par são gravadas juntas ou nenhuma das duas.
#[async_trait]
pub trait ConfirmationStore: Send + Sync {
    async fn insert_pending(&self, new: NewConfirmation) -> Result<Confirmation, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Confirmation>, AppError>;

    async fn find_pending_for_vendeur(
        &self,
        vendeur_id: Uuid,
    ) -> Result<Option<Confirmation>, AppError>;

    /// Retorna `None` quando o registro não existe ou já não está `pending`.
    async fn decide_if_pending(
        &self,
        id: Uuid,
        status: ConfirmationStatus,
        decided_by: Uuid,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<Confirmation>, AppError>;

    /// Como `decide_if_pending` com `approved`, mais a sessão de trabalho do
    /// vendeur apontando para este par, na mesma transação.
    async fn approve_and_activate(
        &self,
        id: Uuid,
        decided_by: Uuid,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<Confirmation>, AppError>;

    /// Mais recentes primeiro.
    async fn list(&self, status: Option<ConfirmationStatus>)
        -> Result<Vec<Confirmation>, AppError>;
}

#[derive(Clone)]
pub struct PgConfirmationRepository {
    pool: PgPool,
}

impl PgConfirmationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfirmationStore for PgConfirmationRepository {
    async fn insert_pending(&self, new: NewConfirmation) -> Result<Confirmation, AppError> {
        // O índice único parcial (vendeur_id WHERE status = 'pending') é quem
        // garante a regra sob concorrência.
        sqlx::query_as::<_, Confirmation>(
            r#"
            INSERT INTO confirmations (vendeur_id, employee_id, status, requester_type, requested_by)
            VALUES ($1, $2, 'pending', $3, $4)
            RETURNING *
            "#,
        )
        .bind(new.vendeur_id)
        .bind(new.employee_id)
        .bind(new.requester_type)
        .bind(new.requested_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicatePending { vendeur_id: new.vendeur_id };
                }
            }
            e.into()
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Confirmation>, AppError> {
        let confirmation =
            sqlx::query_as::<_, Confirmation>("SELECT * FROM confirmations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(confirmation)
    }

    async fn find_pending_for_vendeur(
        &self,
        vendeur_id: Uuid,
    ) -> Result<Option<Confirmation>, AppError> {
        let confirmation = sqlx::query_as::<_, Confirmation>(
            "SELECT * FROM confirmations WHERE vendeur_id = $1 AND status = 'pending'",
        )
        .bind(vendeur_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(confirmation)
    }

    async fn decide_if_pending(
        &self,
        id: Uuid,
        status: ConfirmationStatus,
        decided_by: Uuid,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<Confirmation>, AppError> {
        // UPDATE condicional: só o primeiro a commitar encontra 'pending'.
        let confirmation = sqlx::query_as::<_, Confirmation>(
            r#"
            UPDATE confirmations
            SET status = $2, approved_by = $3, approved_at = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(decided_by)
        .bind(decided_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(confirmation)
    }

    async fn approve_and_activate(
        &self,
        id: Uuid,
        decided_by: Uuid,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<Confirmation>, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Mesmo compare-and-set da decisão
        let confirmation = sqlx::query_as::<_, Confirmation>(
            r#"
            UPDATE confirmations
            SET status = 'approved', approved_by = $2, approved_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(decided_by)
        .bind(decided_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(confirmation) = confirmation else {
            return Ok(None);
        };

        // 2. O par aprovado substitui a sessão anterior do vendeur
        let session = WorkSession {
            vendeur_id: confirmation.vendeur_id,
            employee_id: confirmation.employee_id,
            confirmation_id: confirmation.id,
            started_at: decided_at,
        };
        sqlx::query(
            r#"
            INSERT INTO vendeur_sessions (vendeur_id, employee_id, confirmation_id, started_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (vendeur_id)
            DO UPDATE SET
                employee_id = EXCLUDED.employee_id,
                confirmation_id = EXCLUDED.confirmation_id,
                started_at = EXCLUDED.started_at
            "#,
        )
        .bind(session.vendeur_id)
        .bind(session.employee_id)
        .bind(session.confirmation_id)
        .bind(session.started_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(confirmation))
    }

    async fn list(
        &self,
        status: Option<ConfirmationStatus>,
    ) -> Result<Vec<Confirmation>, AppError> {
        let confirmations = sqlx::query_as::<_, Confirmation>(
            r#"
            SELECT * FROM confirmations
            WHERE ($1::confirmation_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(confirmations)
    }
}
