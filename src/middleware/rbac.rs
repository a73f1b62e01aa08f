// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Role,
};

/// 1. O Trait que define quais papéis abrem a rota
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
    fn label() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

        // A. Extrai a identidade (colocada pelo auth_guard)
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        // B. Verifica o papel
        if !T::allowed().iter().any(|role| user.0.has_role(*role)) {
            return Err(AppError::Unauthorized(format!("papel '{}' necessário", T::label()))
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct ResponsableOnly;
impl RoleDef for ResponsableOnly {
    fn allowed() -> &'static [Role] { &[Role::Responsable] }
    fn label() -> &'static str { "responsable" }
}

// Quem pode mexer no estoque
pub struct StockManager;
impl RoleDef for StockManager {
    fn allowed() -> &'static [Role] { &[Role::Responsable, Role::Employee] }
    fn label() -> &'static str { "responsable|employee" }
}
