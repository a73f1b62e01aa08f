// src/handlers/broadcasting.rs

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    services::notifier::Channel,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChannelAuthPayload {
    #[schema(example = "private-vendeur.0b6c4f0e-2a4c-4d4e-9b0f-8c3a6e2d1f00")]
    pub channel_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChannelAuthResponse {
    pub channel: String,
    pub authorized: bool,
}

// ---
// Handler: authorize_channel
// Responde se a identidade pode assinar o canal pedido pelo cliente de push.
// ---
#[utoipa::path(
    post,
    path = "/api/broadcasting/auth",
    tag = "Broadcasting",
    request_body = ChannelAuthPayload,
    responses(
        (status = 200, description = "Canal autorizado", body = ChannelAuthResponse),
        (status = 403, description = "Assinatura negada"),
        (status = 404, description = "Canal desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn authorize_channel(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(payload): Json<ChannelAuthPayload>,
) -> Result<Json<ChannelAuthResponse>, ApiError> {
    let channel: Channel = payload
        .channel_name
        .parse()
        .map_err(|e: AppError| e.to_api_error(&locale, &app_state.i18n_store))?;

    if !channel.authorize(&identity) {
        tracing::warn!(user = %identity.user.id, %channel, "🚫 Assinatura de canal negada");
        return Err(AppError::Unauthorized(format!("canal '{}'", channel))
            .to_api_error(&locale, &app_state.i18n_store));
    }

    Ok(Json(ChannelAuthResponse { channel: channel.to_string(), authorized: true }))
}
