// src/handlers/confirmations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, ResponsableOnly},
    },
    models::confirmation::{Confirmation, ConfirmationDetail, ConfirmationStatus},
};

// ---
// Payload: pedido de confirmação
// Os dois ids são opcionais: o lado do próprio usuário é completado pelo vínculo dele.
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfirmationPayload {
    pub vendeur_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmationFilter {
    pub status: Option<ConfirmationStatus>,
}

fn missing(field: &'static str, message: &'static str) -> ValidationErrors {
    let mut err = ValidationError::new("required");
    err.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(field, err);
    errors
}

// ---
// Handler: request_confirmation
// ---
#[utoipa::path(
    post,
    path = "/api/confirmations",
    tag = "Confirmations",
    request_body = RequestConfirmationPayload,
    responses(
        (status = 201, description = "Pedido criado (pending)", body = Confirmation),
        (status = 403, description = "Usuário não vinculado ao par"),
        (status = 404, description = "Vendeur ou employee inexistente"),
        (status = 409, description = "Já existe um pedido pendente para o vendeur")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_confirmation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(payload): Json<RequestConfirmationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let vendeur_id = payload.vendeur_id.or(identity.vendeur_id).ok_or_else(|| {
        AppError::ValidationError(missing("vendeurId", "O campo 'vendeurId' é obrigatório."))
            .to_api_error(&locale, &app_state.i18n_store)
    })?;
    let employee_id = payload.employee_id.or(identity.employee_id).ok_or_else(|| {
        AppError::ValidationError(missing("employeeId", "O campo 'employeeId' é obrigatório."))
            .to_api_error(&locale, &app_state.i18n_store)
    })?;

    let confirmation = app_state
        .confirmation_service
        .request_confirmation(vendeur_id, employee_id, &identity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(confirmation)))
}

// ---
// Handler: list_confirmations (painel do Responsable)
// ---
#[utoipa::path(
    get,
    path = "/api/confirmations",
    tag = "Confirmations",
    params(ConfirmationFilter),
    responses(
        (status = 200, description = "Pedidos, mais recentes primeiro", body = Vec<Confirmation>),
        (status = 403, description = "Somente responsables")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_confirmations(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<ResponsableOnly>,
    Query(filter): Query<ConfirmationFilter>,
) -> Result<Json<Vec<Confirmation>>, ApiError> {
    let confirmations = app_state
        .confirmation_service
        .list_confirmations(filter.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(confirmations))
}

// ---
// Handler: current_pending (tela de espera do vendeur)
// ---
#[utoipa::path(
    get,
    path = "/api/confirmations/pending",
    tag = "Confirmations",
    responses(
        (status = 200, description = "O pedido pendente do vendeur, ou null", body = Option<Confirmation>),
        (status = 403, description = "Usuário sem vendeur vinculado")
    ),
    security(("api_jwt" = []))
)]
pub async fn current_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<Option<Confirmation>>, ApiError> {
    let vendeur_id = identity.vendeur_id.ok_or_else(|| {
        AppError::Unauthorized("usuário sem vendeur vinculado".into())
            .to_api_error(&locale, &app_state.i18n_store)
    })?;

    let pending = app_state
        .confirmation_service
        .current_pending(vendeur_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pending))
}

#[utoipa::path(
    get,
    path = "/api/confirmations/{id}",
    tag = "Confirmations",
    params(("id" = Uuid, Path, description = "ID da confirmação")),
    responses(
        (status = 200, description = "Pedido com as partes", body = ConfirmationDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_confirmation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfirmationDetail>, ApiError> {
    let detail = app_state
        .confirmation_service
        .get_detail(id, &identity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

// ---
// Decisões
// ---
#[utoipa::path(
    post,
    path = "/api/confirmations/{id}/approve",
    tag = "Confirmations",
    params(("id" = Uuid, Path, description = "ID da confirmação")),
    responses(
        (status = 200, description = "Aprovada", body = Confirmation),
        (status = 403, description = "Somente responsables"),
        (status = 404, description = "Não encontrada"),
        (status = 409, description = "Já decidida")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Confirmation>, ApiError> {
    let confirmation = app_state
        .confirmation_service
        .approve(id, &identity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(confirmation))
}

#[utoipa::path(
    post,
    path = "/api/confirmations/{id}/reject",
    tag = "Confirmations",
    params(("id" = Uuid, Path, description = "ID da confirmação")),
    responses(
        (status = 200, description = "Rejeitada", body = Confirmation),
        (status = 403, description = "Somente responsables"),
        (status = 404, description = "Não encontrada"),
        (status = 409, description = "Já decidida")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Confirmation>, ApiError> {
    let confirmation = app_state
        .confirmation_service
        .reject(id, &identity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(confirmation))
}
