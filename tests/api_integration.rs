// tests/api_integration.rs

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use gestion_backend::{
    config::{AppState, Config},
    create_app,
    db::{InMemoryStore, Stores},
    models::{
        auth::Role,
        directory::{Employee, Vendeur},
    },
    services::notifier::{events, Channel, RecordingNotifier},
};

struct TestApp {
    app: Router,
    state: AppState,
    store: InMemoryStore,
    notifier: RecordingNotifier,
}

impl TestApp {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let notifier = RecordingNotifier::new();
        let config = Config { jwt_secret: "segredo-de-integracao".into(), ..Config::default() };
        let state = AppState::from_stores(
            Stores::in_memory(store.clone()),
            Arc::new(notifier.clone()),
            &config,
        )
        .unwrap();
        Self { app: create_app(state.clone()), state, store, notifier }
    }

    async fn token_for(&self, name: &str, roles: &[Role]) -> (Uuid, String) {
        let email = format!("{}@gestion.local", Uuid::new_v4());
        let user = self.store.add_user(name, &email, "", roles).await;
        let token = self.state.auth_service.create_token(user.id).unwrap();
        (user.id, token)
    }

    async fn vendeur(&self) -> (Vendeur, String) {
        let (user_id, token) = self.token_for("Moussa Ndiaye", &[Role::Vendeur]).await;
        let vendeur = self.store.add_vendeur(Some(user_id), "Ndiaye", "Moussa").await;
        (vendeur, token)
    }

    async fn employee(&self) -> Employee {
        self.store.add_employee(None, "Sarr", "Fatou").await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[tokio::test]
async fn health_is_public() {
    let t = TestApp::new();
    let response = t
        .app
        .clone()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let t = TestApp::new();

    let (status, body) = t.send(Method::GET, "/api/session/route", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = t.send(Method::GET, "/api/users/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_and_login_over_http() {
    let t = TestApp::new();
    let credentials = json!({ "email": "amina@gestion.local", "password": "secret123" });

    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Amina Diallo", "email": "amina@gestion.local", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].is_string());

    let (status, body) = t.send(Method::POST, "/api/auth/login", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = t.send(Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "amina@gestion.local");
    assert!(me["user"].get("passwordHash").is_none());

    // Sem papel: o gate manda para o dashboard genérico
    let (_, route) = t.send(Method::GET, "/api/session/route", Some(&token), None).await;
    assert_eq!(route["screen"], "dashboard");
    assert_eq!(route["path"], "/dashboard");
}

#[tokio::test]
async fn invalid_registration_is_a_localized_validation_error() {
    let t = TestApp::new();
    let request = Request::post("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .body(Body::from(json!({ "name": "", "email": "nope", "password": "123" }).to_string()))
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["error"], "One or more fields are invalid.");
    assert!(body["details"]["email"].is_array());
}

#[tokio::test]
async fn vendeur_pairing_flow_end_to_end() {
    let t = TestApp::new();
    let (_, responsable) = t.token_for("Responsable", &[Role::Responsable]).await;
    let (vendeur, vendeur_token) = t.vendeur().await;
    let e1 = t.employee().await;
    let e2 = t.employee().await;

    // 1. Sem pedido nem sessão: seleção de employee
    let (status, route) = t.send(Method::GET, "/api/session/route", Some(&vendeur_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(route["screen"], "employee_selection");

    // 2. Pedido
    let (status, created) = t
        .send(
            Method::POST,
            "/api/confirmations",
            Some(&vendeur_token),
            Some(json!({ "employeeId": e1.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["vendeurId"], vendeur.id.to_string());
    let confirmation_id = created["id"].as_str().unwrap().to_string();

    let requested = t.notifier.events_named(events::CONFIRMATION_REQUESTED);
    assert_eq!(requested.len(), 1);
    assert_eq!(requested[0].channel, Channel::Responsables);

    // 3. Enquanto pendente: tela de espera e segundo pedido recusado
    let (_, route) = t.send(Method::GET, "/api/session/route", Some(&vendeur_token), None).await;
    assert_eq!(route["screen"], "waiting_confirmation");
    assert_eq!(route["confirmation"]["id"], confirmation_id);

    let (status, body) = t
        .send(
            Method::POST,
            "/api/confirmations",
            Some(&vendeur_token),
            Some(json!({ "employeeId": e2.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["vendeurId"], vendeur.id.to_string());

    let (status, pending) = t
        .send(Method::GET, "/api/confirmations/pending", Some(&vendeur_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["id"], confirmation_id);

    // 4. O vendeur não decide; o responsable vê a fila e aprova
    let approve_uri = format!("/api/confirmations/{}/approve", confirmation_id);
    let (status, _) = t.send(Method::POST, &approve_uri, Some(&vendeur_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, queue) = t
        .send(Method::GET, "/api/confirmations?status=pending", Some(&responsable), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let (status, approved) = t.send(Method::POST, &approve_uri, Some(&responsable), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert!(approved["approvedAt"].is_string());

    let decided = t.notifier.events_named(events::CONFIRMATION_APPROVED);
    assert_eq!(decided.len(), 1);
    assert_eq!(decided[0].channel.to_string(), format!("vendeur.{}", vendeur.id));

    // 5. Par ativo: dashboard do vendeur
    let (_, route) = t.send(Method::GET, "/api/session/route", Some(&vendeur_token), None).await;
    assert_eq!(route["screen"], "vendeur_dashboard");
    assert_eq!(route["employeeId"], e1.id.to_string());

    // 6. Segunda decisão: conflito
    let reject_uri = format!("/api/confirmations/{}/reject", confirmation_id);
    let (status, body) = t.send(Method::POST, &reject_uri, Some(&responsable), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["status"], "approved");

    // 7. Detalhe com as partes
    let detail_uri = format!("/api/confirmations/{}", confirmation_id);
    let (status, detail) = t.send(Method::GET, &detail_uri, Some(&vendeur_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["employee"]["id"], e1.id.to_string());
    assert_eq!(detail["approver"]["name"], "Responsable");

    // 8. Encerrar a sessão volta para a seleção
    let (status, _) = t
        .send(Method::DELETE, "/api/session/employee", Some(&vendeur_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, route) = t.send(Method::GET, "/api/session/route", Some(&vendeur_token), None).await;
    assert_eq!(route["screen"], "employee_selection");
}

#[tokio::test]
async fn unknown_confirmation_is_404() {
    let t = TestApp::new();
    let (_, responsable) = t.token_for("Responsable", &[Role::Responsable]).await;

    let uri = format!("/api/confirmations/{}/approve", Uuid::new_v4());
    let (status, _) = t.send(Method::POST, &uri, Some(&responsable), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_confirmations_is_responsable_only() {
    let t = TestApp::new();
    let (_, vendeur_token) = t.vendeur().await;

    let (status, _) = t.send(Method::GET, "/api/confirmations", Some(&vendeur_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stock_alerts_through_produit_endpoints() {
    let t = TestApp::new();
    let (_, responsable) = t.token_for("Responsable", &[Role::Responsable]).await;
    let (_, employee) = t.token_for("Employee", &[Role::Employee]).await;
    let (_, vendeur_token) = t.vendeur().await;

    let payload = json!({
        "reference": "CIM-45",
        "description": "Ciment CPJ 45",
        "qteStock": 5,
        "unite": "sac",
        "prixUnitaire": 4500.0
    });

    // Vendeur não mexe no estoque
    let (status, _) = t
        .send(Method::POST, "/api/produits", Some(&vendeur_token), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, produit) = t
        .send(Method::POST, "/api/produits", Some(&employee), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let produit_uri = format!("/api/produits/{}", produit["id"].as_str().unwrap());

    let (status, _) = t.send(Method::POST, "/api/produits", Some(&employee), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Alerta entregue ao responsable
    let (_, count) = t
        .send(Method::GET, "/api/notifications/unread-count", Some(&responsable), None)
        .await;
    assert_eq!(count["unread"], 1);

    // Nova baixa dentro da janela: suprimida
    let (status, updated) = t
        .send(Method::PUT, &produit_uri, Some(&employee), Some(json!({ "qteStock": 0 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["qteStock"], 0);

    let (_, count) = t
        .send(Method::GET, "/api/notifications/unread-count", Some(&responsable), None)
        .await;
    assert_eq!(count["unread"], 1);
    assert_eq!(t.notifier.events_named(events::STOCK_ALERT).len(), 1);

    // Quantidade negativa é recusada
    let (status, _) = t
        .send(Method::PUT, &produit_uri, Some(&employee), Some(json!({ "qteStock": -1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Lida a notificação, a próxima baixa volta a alertar
    let (_, inbox) = t.send(Method::GET, "/api/notifications", Some(&responsable), None).await;
    let notification_id = inbox[0]["id"].as_str().unwrap().to_string();
    assert_eq!(inbox[0]["data"]["type"], "low_stock");

    let read_uri = format!("/api/notifications/{}/read", notification_id);
    let (status, _) = t.send(Method::POST, &read_uri, Some(&responsable), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    t.send(Method::PUT, &produit_uri, Some(&employee), Some(json!({ "qteStock": 3 })))
        .await;
    let (_, inbox) = t
        .send(Method::GET, "/api/notifications?unreadOnly=true", Some(&responsable), None)
        .await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);

    let (status, marked) = t
        .send(Method::POST, "/api/notifications/read-all", Some(&responsable), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["updated"], 1);
}

#[tokio::test]
async fn channel_authorization_endpoint() {
    let t = TestApp::new();
    let (vendeur, vendeur_token) = t.vendeur().await;
    let (_, responsable) = t.token_for("Responsable", &[Role::Responsable]).await;

    let own = json!({ "channel_name": format!("private-vendeur.{}", vendeur.id) });
    let (status, body) = t
        .send(Method::POST, "/api/broadcasting/auth", Some(&vendeur_token), Some(own.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["channel"], format!("vendeur.{}", vendeur.id));

    let (status, _) = t
        .send(Method::POST, "/api/broadcasting/auth", Some(&responsable), Some(own))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = json!({ "channel_name": "responsables" });
    let (status, _) = t
        .send(Method::POST, "/api/broadcasting/auth", Some(&responsable), Some(admin.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t
        .send(Method::POST, "/api/broadcasting/auth", Some(&vendeur_token), Some(admin))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let bogus = json!({ "channel_name": "tenant.42" });
    let (status, _) = t
        .send(Method::POST, "/api/broadcasting/auth", Some(&vendeur_token), Some(bogus))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let t = TestApp::new();
    let (status, doc) = t.send(Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/confirmations/{id}/approve"].is_object());
}
