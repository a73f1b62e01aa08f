// src/db/directory_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{Identity, Role, User},
        directory::{Employee, Vendeur},
    },
};

/// Provedor de identidades e papéis. Somente leitura para o núcleo,
/// exceto pela criação de contas no registro.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError>;

    /// Usuário + papéis + vínculos Vendeur/Employee.
    async fn resolve_identity(&self, user_id: Uuid) -> Result<Option<Identity>, AppError>;

    async fn user_ids_with_role(&self, role: Role) -> Result<Vec<Uuid>, AppError>;

    async fn find_vendeur(&self, id: Uuid) -> Result<Option<Vendeur>, AppError>;

    async fn find_employee(&self, id: Uuid) -> Result<Option<Employee>, AppError>;

    async fn list_vendeurs(&self) -> Result<Vec<Vendeur>, AppError>;

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError>;
}

// O repositório de diretório, responsável pelas tabelas users, user_roles, vendeurs e employees
#[derive(Clone)]
pub struct PgDirectoryRepository {
    pool: PgPool,
}

impl PgDirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryRepository {
    // Busca um usuário pelo seu e-mail
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Cria um novo usuário no banco de dados (sem papéis)
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Converte erro de violação de chave única em um erro mais amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    async fn resolve_identity(&self, user_id: Uuid) -> Result<Option<Identity>, AppError> {
        let Some(user) = self.find_user_by_id(user_id).await? else {
            return Ok(None);
        };

        let roles = sqlx::query_scalar::<_, Role>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let vendeur_id =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM vendeurs WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let employee_id =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM employees WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(Some(Identity { user, roles, vendeur_id, employee_id }))
    }

    async fn user_ids_with_role(&self, role: Role) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM user_roles WHERE role = $1 ORDER BY user_id",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn find_vendeur(&self, id: Uuid) -> Result<Option<Vendeur>, AppError> {
        let vendeur = sqlx::query_as::<_, Vendeur>("SELECT * FROM vendeurs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vendeur)
    }

    async fn find_employee(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn list_vendeurs(&self) -> Result<Vec<Vendeur>, AppError> {
        let vendeurs =
            sqlx::query_as::<_, Vendeur>("SELECT * FROM vendeurs ORDER BY nom ASC, prenom ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(vendeurs)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        let employees =
            sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY nom ASC, prenom ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(employees)
    }
}
