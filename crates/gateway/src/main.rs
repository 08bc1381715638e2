use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use subtracker_gateway::{build_router, config::GatewayConfig, ResultExt};

#[ctor::ctor]
fn init() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,subtracker_gateway=debug,tower_http=info".into()),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::load().log("Failed to load gateway configuration")?;
    let app = build_router(&config).log("Failed to build router")?;

    let addr = config.bind_address();
    tracing::info!(%addr, upstream = %config.upstream.base_url, "starting edge gate");
    tracing::info!(
        "Protected: {}/* (session), {}/* (role={}); cookie={}",
        config.auth.dashboard_prefix,
        config.auth.admin_prefix,
        config.auth.admin_role,
        config.auth.cookie_name
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .log("Failed to bind to address")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .log("Failed to serve app")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
