// src/handlers/directory.rs

use axum::{extract::State, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::directory::{Employee, Vendeur},
};

// Listas usadas nas telas de seleção do par
#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Directory",
    responses((status = 200, description = "Employees cadastrados", body = Vec<Employee>)),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let employees = app_state
        .directory
        .list_employees()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employees))
}

#[utoipa::path(
    get,
    path = "/api/vendeurs",
    tag = "Directory",
    responses((status = 200, description = "Vendeurs cadastrados", body = Vec<Vendeur>)),
    security(("api_jwt" = []))
)]
pub async fn list_vendeurs(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Vendeur>>, ApiError> {
    let vendeurs = app_state
        .directory
        .list_vendeurs()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vendeurs))
}
