//src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Json, Router,
};
use utoipa::OpenApi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

/// Monta o router completo sobre um `AppState` já construído.
pub fn create_app(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new().route("/me", get(handlers::auth::get_me));

    // Session Gate
    let session_routes = Router::new()
        .route("/route", get(handlers::session::next_route))
        .route("/employee", delete(handlers::session::end_session));

    let confirmation_routes = Router::new()
        .route(
            "/",
            post(handlers::confirmations::request_confirmation)
                .get(handlers::confirmations::list_confirmations),
        )
        .route("/pending", get(handlers::confirmations::current_pending))
        .route("/{id}", get(handlers::confirmations::get_confirmation))
        .route("/{id}/approve", post(handlers::confirmations::approve))
        .route("/{id}/reject", post(handlers::confirmations::reject));

    let produit_routes = Router::new()
        .route(
            "/",
            post(handlers::produits::create_produit).get(handlers::produits::list_produits),
        )
        .route(
            "/{id}",
            get(handlers::produits::get_produit).put(handlers::produits::update_produit),
        );

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route("/unread-count", get(handlers::notifications::unread_count))
        .route("/read-all", post(handlers::notifications::mark_all_read))
        .route("/{id}/read", post(handlers::notifications::mark_read));

    // Tudo abaixo exige um Bearer válido
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/session", session_routes)
        .nest("/confirmations", confirmation_routes)
        .nest("/produits", produit_routes)
        .nest("/notifications", notification_routes)
        .route("/employees", get(handlers::directory::list_employees))
        .route("/vendeurs", get(handlers::directory::list_vendeurs))
        .route("/broadcasting/auth", post(handlers::broadcasting::authorize_channel))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let api = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .route("/api-docs/openapi.json", get(|| async { Json(docs::ApiDoc::openapi()) }))
        .with_state(app_state)
}
