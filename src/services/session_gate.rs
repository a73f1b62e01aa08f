// src/services/session_gate.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{ConfirmationStore, SessionStore, Stores},
    models::{
        auth::{Identity, Role},
        session::Route,
    },
};

/// Decide a próxima tela permitida para uma identidade autenticada.
#[derive(Clone)]
pub struct SessionGate {
    confirmations: Arc<dyn ConfirmationStore>,
    sessions: Arc<dyn SessionStore>,
}

impl SessionGate {
    pub fn new(stores: &Stores) -> Self {
        Self {
            confirmations: stores.confirmations.clone(),
            sessions: stores.sessions.clone(),
        }
    }

    // A primeira regra que casar vence (ordem de Role::BY_PRIORITY)
    pub async fn next_route(&self, identity: &Identity) -> Result<Route, AppError> {
        let route = match identity.primary_role() {
            Some(Role::Responsable) => Route::AdminDashboard,
            Some(Role::Employee) => Route::EmployeeDashboard,
            Some(Role::Vendeur) => self.vendeur_route(identity).await?,
            None => Route::Dashboard,
        };

        tracing::debug!(user = %identity.user.id, path = route.path(), "Rota decidida");
        Ok(route)
    }

    async fn vendeur_route(&self, identity: &Identity) -> Result<Route, AppError> {
        let vendeur_id = identity.vendeur_id.ok_or_else(|| {
            AppError::Unauthorized("usuário vendeur sem cadastro de vendeur vinculado".into())
        })?;

        // Um pedido pendente tem precedência sobre qualquer sessão anterior
        if let Some(confirmation) = self.confirmations.find_pending_for_vendeur(vendeur_id).await? {
            return Ok(Route::WaitingConfirmation { confirmation });
        }

        Ok(match self.sessions.active_session(vendeur_id).await? {
            Some(session) => Route::VendeurDashboard { employee_id: session.employee_id },
            None => Route::EmployeeSelection,
        })
    }

    /// Encerra a sessão de trabalho do vendeur. `false` se não havia nenhuma.
    pub async fn end_session(&self, identity: &Identity) -> Result<bool, AppError> {
        let vendeur_id = identity.vendeur_id.ok_or_else(|| {
            AppError::Unauthorized("somente um vendeur possui sessão de trabalho".into())
        })?;

        let ended = self.sessions.end(vendeur_id).await?;
        if ended {
            tracing::info!(%vendeur_id, "👋 Sessão de trabalho encerrada");
        }
        Ok(ended)
    }
}
