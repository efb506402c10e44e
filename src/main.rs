use std::sync::Arc;

use health_assist::agent::Agent;
use health_assist::config::Config;
use health_assist::llm::{create_provider, LlmConfig};
use health_assist::routes::{app, AppState};
use health_assist::store::{LibSqlStore, ProfileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    eprintln!("🩺 Health Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Webhook: http://0.0.0.0:{}/", config.port);
    eprintln!("   Chat API: http://0.0.0.0:{}/api\n", config.port);

    let llm = create_provider(&LlmConfig {
        api_key: config.api_key.clone(),
        api_url: config.api_url.clone(),
        model: config.model.clone(),
    })?;

    let store: Arc<dyn ProfileStore> = Arc::new(LibSqlStore::new_local(&config.db_path).await?);

    let agent = Arc::new(Agent::new(Arc::clone(&store), Arc::clone(&llm)));
    let state = AppState { agent, llm };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Webhook server started");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
