// src/handlers/session.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::session::RouteResponse,
};

// ---
// Handler: next_route (Session Gate)
// ---
#[utoipa::path(
    get,
    path = "/api/session/route",
    tag = "Session",
    responses(
        (status = 200, description = "Próxima tela permitida", body = RouteResponse),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Vendeur sem cadastro vinculado")
    ),
    security(("api_jwt" = []))
)]
pub async fn next_route(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<RouteResponse>, ApiError> {
    let route = app_state
        .session_gate
        .next_route(&identity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(route.into()))
}

// ---
// Handler: end_session (troca de employee)
// ---
#[utoipa::path(
    delete,
    path = "/api/session/employee",
    tag = "Session",
    responses(
        (status = 204, description = "Sessão de trabalho encerrada"),
        (status = 403, description = "Somente vendeurs")
    ),
    security(("api_jwt" = []))
)]
pub async fn end_session(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .session_gate
        .end_session(&identity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
