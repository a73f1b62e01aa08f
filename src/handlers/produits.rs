// src/handlers/produits.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, StockManager},
    },
    models::produit::{NewProduit, Produit, ProduitChanges},
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("La valeur ne peut pas être négative.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: CreateProduit
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduitPayload {
    #[validate(length(min = 1, message = "La référence est obligatoire."))]
    #[schema(example = "PRD-0042")]
    pub reference: String,

    #[validate(length(min = 1, message = "La description est obligatoire."))]
    pub description: String,

    #[serde(default)]
    #[validate(range(min = 0, message = "La quantité ne peut pas être négative."))]
    pub qte_stock: i32,

    #[validate(length(min = 1, message = "L'unité est obligatoire."))]
    #[schema(example = "sac")]
    pub unite: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 4500.0)]
    pub prix_unitaire: Decimal,
}

// ---
// Payload: UpdateProduit (campos ausentes ficam como estão)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduitPayload {
    #[validate(length(min = 1, message = "La description est obligatoire."))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "La quantité ne peut pas être négative."))]
    pub qte_stock: Option<i32>,

    #[validate(length(min = 1, message = "L'unité est obligatoire."))]
    pub unite: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub prix_unitaire: Option<Decimal>,
}

#[utoipa::path(
    post,
    path = "/api/produits",
    tag = "Produits",
    request_body = CreateProduitPayload,
    responses(
        (status = 201, description = "Produto criado", body = Produit),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Referência já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_produit(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<StockManager>,
    Json(payload): Json<CreateProduitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let produit = app_state
        .produit_service
        .create(NewProduit {
            reference: payload.reference,
            description: payload.description,
            qte_stock: payload.qte_stock,
            unite: payload.unite,
            prix_unitaire: payload.prix_unitaire,
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(produit)))
}

#[utoipa::path(
    get,
    path = "/api/produits",
    tag = "Produits",
    responses((status = 200, description = "Catálogo por referência", body = Vec<Produit>)),
    security(("api_jwt" = []))
)]
pub async fn list_produits(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Produit>>, ApiError> {
    let produits = app_state
        .produit_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(produits))
}

#[utoipa::path(
    get,
    path = "/api/produits/{id}",
    tag = "Produits",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Produit),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_produit(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Produit>, ApiError> {
    let produit = app_state
        .produit_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(produit))
}

#[utoipa::path(
    put,
    path = "/api/produits/{id}",
    tag = "Produits",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProduitPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Produit),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_produit(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<StockManager>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProduitPayload>,
) -> Result<Json<Produit>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let produit = app_state
        .produit_service
        .update(
            id,
            ProduitChanges {
                description: payload.description,
                qte_stock: payload.qte_stock,
                unite: payload.unite,
                prix_unitaire: payload.prix_unitaire,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(produit))
}
