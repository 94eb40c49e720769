use fresheye::{app, config::AppConfig, reports, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "fresheye=debug,axum=info,tower_http=info".to_string());
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

    let config = AppConfig::from_env()?;
    // No on-device weights are bundled; an embedding binary passes its
    // ImageModel here.
    let app_state = AppState::init(config, None).await?;

    let _reports = reports::scheduler::start(app_state.report_context(), &app_state.config.reports)?;

    let config = app_state.config.clone();
    app::serve(app::build_app(app_state), &config).await
}
