use user_service::{app, auth, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let app_state = AppState::init()?;
    let config = app_state.config.clone();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.default_log_filter().to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    if config.debug {
        tracing::warn!("debug mode enabled: error details are returned to clients; never use in production");
    }
    tracing::info!(database = %config.database_path, "using sqlite database");

    auth::password::init_dummy_hash();
    let app = app::build_app(app_state);
    app::serve(app, &config.bind_addr()).await
}
