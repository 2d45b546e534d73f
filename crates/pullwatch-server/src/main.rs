use anyhow::Result;
use pullwatch_core::ServerConfig;
use pullwatch_server::{router, AppState};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    let default_filter = if config.debug {
        "pullwatch_server=debug,pullwatch_core=debug,tower_http=debug"
    } else {
        "pullwatch_server=info,pullwatch_core=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let mut app = router(AppState::default());
    if config.debug {
        app = app.layer(TraceLayer::new_for_http());
    }

    let addr = config.bind_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
