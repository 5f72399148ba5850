use nutribob::{app, config::MlConfig, state::MlState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = MlConfig::from_env()?;
    let addr = config.bind_addr;
    tracing::info!(model_dir = %config.model_dir.display(), "starting analysis service");
    let state = MlState::init(&config)?;

    app::serve(addr, app::build_ml_app(state)).await
}
