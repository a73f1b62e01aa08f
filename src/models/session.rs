// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::models::confirmation::Confirmation;

// O par Vendeur/Employee ativo (o "employee selecionado" da sessão de trabalho)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub vendeur_id: Uuid,
    pub employee_id: Uuid,
    pub confirmation_id: Uuid,
    pub started_at: DateTime<Utc>,
}

// A próxima tela permitida para a identidade
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Route {
    AdminDashboard,
    EmployeeDashboard,
    WaitingConfirmation {
        confirmation: Confirmation,
    },
    EmployeeSelection,
    VendeurDashboard {
        #[serde(rename = "employeeId")]
        employee_id: Uuid,
    },
    Dashboard,
}

impl Route {
    /// Caminho no front-end
    pub fn path(&self) -> &'static str {
        match self {
            Route::AdminDashboard => "/admin/dashboard",
            Route::EmployeeDashboard => "/employee/dashboard",
            Route::WaitingConfirmation { .. } => "/vendeur/attente-confirmation",
            Route::EmployeeSelection => "/vendeur/select-employee",
            Route::VendeurDashboard { .. } => "/vendeur/dashboard",
            Route::Dashboard => "/dashboard",
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub path: &'static str,
    #[serde(flatten)]
    pub route: Route,
}

impl From<Route> for RouteResponse {
    fn from(route: Route) -> Self {
        Self { path: route.path(), route }
    }
}
