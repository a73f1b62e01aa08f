// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

// --- PAPÉIS ---
// Conjunto fechado de capacidades. Mapeia o CREATE TYPE app_role do banco.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "app_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Responsable,
    Employee,
    Vendeur,
}

impl Role {
    /// Ordem de prioridade usada pelo Session Gate.
    pub const BY_PRIORITY: [Role; 3] = [Role::Responsable, Role::Employee, Role::Vendeur];
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    #[schema(example = "Amina Diallo")]
    pub name: String,

    #[schema(example = "amina@gestion.local")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// Identidade autenticada: o usuário + os papéis + os vínculos Vendeur/Employee
// ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user: User,
    pub roles: Vec<Role>,
    pub vendeur_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
}

impl Identity {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// O papel de maior prioridade que a identidade possui, se houver.
    pub fn primary_role(&self) -> Option<Role> {
        Role::BY_PRIORITY.into_iter().find(|role| self.has_role(*role))
    }

    pub fn display_name(&self) -> &str {
        &self.user.name
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, message = "Le nom est obligatoire."))]
    #[schema(example = "Amina Diallo")]
    pub name: String,
    #[validate(email(message = "L'adresse e-mail est invalide."))]
    #[schema(example = "amina@gestion.local")]
    pub email: String,
    #[validate(length(min = 6, message = "Le mot de passe doit contenir au moins 6 caractères."))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "L'adresse e-mail est invalide."))]
    #[schema(example = "amina@gestion.local")]
    pub email: String,
    #[validate(length(min = 6, message = "Le mot de passe doit contenir au moins 6 caractères."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
