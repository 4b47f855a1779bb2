use anyhow::Context;
use api::config::Config;
use api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let port = config.port;

    let state = AppState::from_config(config).await?;
    tracing::info!("ML service at {}", state.predictor.base_url());

    let app = api::router(state);

    if std::env::var("AWS_LAMBDA_RUNTIME_API").is_ok() {
        let app = tower::ServiceBuilder::new()
            .layer(axum_aws_lambda::LambdaLayer::default())
            .service(app);

        lambda_http::run(app)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
    } else {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;

        tracing::info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, app).await?;
    }

    Ok(())
}
