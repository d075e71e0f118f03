use hrms_backend::{
    build_router,
    config::{Config, LogFormat},
    AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hrms_backend=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!(api = %config.api_base_url, "HRMS API upstream");
    if config.api_service_token.is_none() {
        tracing::warn!("API_SERVICE_TOKEN not set, requests without a bearer token go upstream anonymously");
    }
    if !config.remarks_question_ids.is_empty() {
        info!(ids = ?config.remarks_question_ids, "treating questions as free-text remarks");
    }

    let app_state = AppState::new(&config)?;
    let app = build_router(app_state, config.public_rps);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
