mod clients;
mod config;
mod error;
mod model;
mod routes;
mod samples;
mod services;
mod state;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::ServiceConfig::from_env()?;
    let clients = clients::Collaborators::from_config(&config)?;
    tracing::info!(
        rag = %config.endpoints.rag,
        report = %config.endpoints.report,
        social = %config.endpoints.social,
        jobs = %config.endpoints.jobs,
        "collaborators configured"
    );

    let port = config.port;
    let state = state::AppState::new(config, clients);

    // Background status simulation.
    let _simulation = services::simulation::spawn_simulation_task(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "disasterlens listening");
    axum::serve(listener, app).await?;
    Ok(())
}
