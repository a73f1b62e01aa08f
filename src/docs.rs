// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Session ---
        handlers::session::next_route,
        handlers::session::end_session,

        // --- Directory ---
        handlers::directory::list_employees,
        handlers::directory::list_vendeurs,

        // --- Confirmations ---
        handlers::confirmations::request_confirmation,
        handlers::confirmations::list_confirmations,
        handlers::confirmations::current_pending,
        handlers::confirmations::get_confirmation,
        handlers::confirmations::approve,
        handlers::confirmations::reject,

        // --- Produits ---
        handlers::produits::create_produit,
        handlers::produits::list_produits,
        handlers::produits::get_produit,
        handlers::produits::update_produit,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::unread_count,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,

        // --- Broadcasting ---
        handlers::broadcasting::authorize_channel,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::Identity,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Directory ---
            models::directory::Vendeur,
            models::directory::Employee,

            // --- Confirmations ---
            models::confirmation::ConfirmationStatus,
            models::confirmation::RequesterType,
            models::confirmation::Confirmation,
            models::confirmation::ConfirmationDetail,
            handlers::confirmations::RequestConfirmationPayload,

            // --- Session ---
            models::session::WorkSession,
            models::session::Route,
            models::session::RouteResponse,

            // --- Produits ---
            models::produit::Produit,
            handlers::produits::CreateProduitPayload,
            handlers::produits::UpdateProduitPayload,

            // --- Notifications ---
            models::notification::NotificationKind,
            models::notification::Notification,
            models::notification::UnreadCount,
            handlers::notifications::MarkedRead,

            // --- Broadcasting ---
            handlers::broadcasting::ChannelAuthPayload,
            handlers::broadcasting::ChannelAuthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Session", description = "Roteamento pós-login e sessão de trabalho"),
        (name = "Directory", description = "Vendeurs e Employees"),
        (name = "Confirmations", description = "Pedidos de confirmação Vendeur/Employee"),
        (name = "Produits", description = "Catálogo e saldo de estoque"),
        (name = "Notifications", description = "Caixa de entrada do usuário"),
        (name = "Broadcasting", description = "Autorização de canais de push")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
