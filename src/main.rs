//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falló la ejecución de las migraciones")?;

    tracing::info!("✅ Migraciones de la base ejecutadas con éxito!");

    let app = routes::build_router(app_state);

    let listener = TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {}", config.server_addr))?;
    tracing::info!("🚀 Servidor escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .context("Error en el servidor Axum")?;

    Ok(())
}
