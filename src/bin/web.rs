use nutribob::{app, config::WebConfig, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = WebConfig::from_env()?;
    let addr = config.bind_addr;
    let state = AppState::init(config).await?;

    app::serve(addr, app::build_web_app(state)).await
}
