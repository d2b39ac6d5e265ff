use budgex::config::Config;
use budgex::observability::Telemetry;
use budgex::server::{build_app, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let telemetry = Telemetry::install(&config.log)?;

    tracing::info!(
        service = telemetry.service(),
        version = budgex::VERSION,
        "Starting on {}",
        config.address()
    );

    let host = config.host.clone();
    let port = config.port;
    let (state, app) = build_app(config, telemetry)?;

    let (actual_port, handle) = serve(app, &host, port).await?;
    tracing::info!("Listening on http://{}:{}", host, actual_port);

    handle.await??;

    tracing::info!("Closing database pool");
    drop(state);
    tracing::info!("Server exited");
    Ok(())
}
