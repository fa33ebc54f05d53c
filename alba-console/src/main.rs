use alba_console::config::{create_backend, ConsoleConfig};
use alba_console::session::FileTokenStore;
use alba_console::{build_app, AppState};
use anyhow::Context;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let config = ConsoleConfig::from_env()?;
    let backend = create_backend(&config)?;
    let store = Arc::new(FileTokenStore::in_dir(&config.state_dir));
    let addr = config.bind_addr;

    let state = AppState::new(backend, store, config);
    state.session.restore().await;

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("Alba console listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
