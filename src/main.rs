// main.rs
use poem::listener::TcpListener;
use tracing_subscriber::EnvFilter;
use yatube::config::Config;
use yatube::{AppState, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let db = db::connect(&config.database).await?;
    tokio::fs::create_dir_all(&config.media.root).await?;
    let state = AppState::new(db, &config);

    tracing::info!(addr = %config.bind_addr(), "yatube listening");
    poem::Server::new(TcpListener::bind(config.bind_addr()))
        .run(yatube::app(state))
        .await?;
    Ok(())
}
