// src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tours_backend::{
    app,
    common::db_utils::connect_pool,
    config::{AppState, Config},
    db::{MemoryStore, Repositories},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tours_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();

    let config = Config::from_env()?;

    let repos = match &config.database_url {
        Some(url) => {
            let pool = connect_pool(url).await.context("Falha ao conectar ao banco de dados")?;
            tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

            sqlx::migrate!()
                .run(&pool)
                .await
                .context("Falha ao rodar as migrações do banco de dados")?;
            tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

            Repositories::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL ausente: usando armazenamento em memória");
            Repositories::in_memory(MemoryStore::new())
        }
    };

    let app_state = AppState::from_config(&config, repos)?;

    let seeded = app_state.catalog.seed_defaults().await?;
    if seeded > 0 {
        tracing::info!("Catálogo padrão gravado: {} registros", seeded);
    }

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        app_state.auth_service.bootstrap_admin(email, password).await?;
    }

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao abrir {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", config.bind_addr);

    axum::serve(listener, app(app_state)).await?;
    Ok(())
}
