use actix_web::HttpServer;
use hmac_gate::{AppState, AuthConfig, LogFormat, ServerConfig, create_app};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let server_config = ServerConfig::from_env();
    init_tracing(server_config.log_format);

    let auth_config = AuthConfig::from_env();
    let state = AppState::from_config(auth_config, server_config.clone())
        .map_err(std::io::Error::other)?;
    state.start_background_tasks();

    tracing::info!(
        bind_address = %server_config.bind_address,
        tolerance_seconds = state.auth_config.timestamp_tolerance_seconds,
        replay_ttl_seconds = state.auth_config.replay_ttl_seconds,
        "server starting"
    );

    let app_state = state.clone();
    let result = HttpServer::new(move || create_app(&app_state))
        .bind(&server_config.bind_address)?
        .run()
        .await;

    state.shutdown();
    result
}
