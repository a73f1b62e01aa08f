//src/main.rs

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use gestion_backend::{
    config::{connect_database, AppState, Config},
    create_app,
    db::Stores,
    services::notifier::BroadcastNotifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger: RUST_LOG controla o nível (padrão: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let db_pool = connect_database(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Fila de eventos: o consumidor em segundo plano registra cada entrega
    let notifier = BroadcastNotifier::new(1024);
    let _delivery = notifier.spawn_delivery_log();

    let app_state = AppState::from_stores(Stores::postgres(db_pool), Arc::new(notifier), &config)?;
    let app = create_app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(config.addr())
        .await
        .context("Falha ao iniciar o listener TCP")?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
