// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{DirectoryStore, Stores},
    services::{
        auth::AuthService,
        confirmation_service::ConfirmationService,
        notification_service::NotificationService,
        notifier::Notifier,
        produit_service::ProduitService,
        session_gate::SessionGate,
        stock_watcher::{StockWatcher, DEFAULT_THRESHOLD, DEFAULT_WINDOW_MINUTES},
    },
};

// Configuração lida do ambiente (.env incluído)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub stock_alert_threshold: i32,
    pub stock_alert_window_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: String::new(),
            host: "0.0.0.0".into(),
            port: 3000,
            db_max_connections: 5,
            stock_alert_threshold: DEFAULT_THRESHOLD,
            stock_alert_window_minutes: DEFAULT_WINDOW_MINUTES,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Separado de `from_env` para os testes não dependerem do ambiente do processo
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            database_url,
            jwt_secret,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            stock_alert_threshold: parse_or(
                &lookup,
                "STOCK_ALERT_THRESHOLD",
                defaults.stock_alert_threshold,
            )?,
            stock_alert_window_minutes: parse_or(
                &lookup,
                "STOCK_ALERT_WINDOW_MINUTES",
                defaults.stock_alert_window_minutes,
            )?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn stock_alert_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.stock_alert_window_minutes)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválido: '{}'", key, raw)),
        None => Ok(default),
    }
}

pub async fn connect_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .context("Falha ao conectar ao banco de dados")?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub confirmation_service: ConfirmationService,
    pub session_gate: SessionGate,
    pub produit_service: ProduitService,
    pub notification_service: NotificationService,
    pub directory: Arc<dyn DirectoryStore>,
    pub i18n_store: Arc<I18nStore>,
}

impl AppState {
    /// Monta o gráfico de dependências sobre qualquer conjunto de stores.
    pub fn from_stores(
        stores: Stores,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let watcher = StockWatcher::new(
            &stores,
            notifier.clone(),
            i18n_store.clone(),
            config.stock_alert_threshold,
            config.stock_alert_window(),
        );

        Ok(Self {
            auth_service: AuthService::new(&stores, config.jwt_secret.clone()),
            confirmation_service: ConfirmationService::new(&stores, notifier, i18n_store.clone()),
            session_gate: SessionGate::new(&stores),
            produit_service: ProduitService::new(&stores, watcher),
            notification_service: NotificationService::new(&stores),
            directory: stores.directory.clone(),
            i18n_store,
        })
    }
}
