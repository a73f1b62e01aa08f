// src/db/session_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::session::WorkSession};

/// Sessões de trabalho: no máximo um par ativo por vendeur.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn active_session(&self, vendeur_id: Uuid) -> Result<Option<WorkSession>, AppError>;

    /// Substitui qualquer sessão anterior do vendeur.
    async fn activate(&self, session: WorkSession) -> Result<(), AppError>;

    /// `false` se não havia sessão ativa.
    async fn end(&self, vendeur_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionRepository {
    async fn active_session(&self, vendeur_id: Uuid) -> Result<Option<WorkSession>, AppError> {
        let session = sqlx::query_as::<_, WorkSession>(
            "SELECT * FROM vendeur_sessions WHERE vendeur_id = $1",
        )
        .bind(vendeur_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn activate(&self, session: WorkSession) -> Result<(), AppError> {
        // UPSERT: o par aprovado mais recente vence
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
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn end(&self, vendeur_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vendeur_sessions WHERE vendeur_id = $1")
            .bind(vendeur_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
