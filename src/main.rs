use std::sync::Arc;

use team_pulse::api::{PulseState, pulse_routes};
use team_pulse::config::{self, SourceConfig};
use team_pulse::source;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let (server_config, pulse_config) = config::load_from_env()?;

    eprintln!("📊 Team Pulse v{}", env!("CARGO_PKG_VERSION"));
    match &server_config.source {
        SourceConfig::File(path) => eprintln!("   Source: file {}", path.display()),
        SourceConfig::Http(url) => eprintln!("   Source: http {}", url),
    }
    eprintln!(
        "   Terminal statuses: {}",
        pulse_config
            .terminal_statuses
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    eprintln!(
        "   Primary space: {}",
        pulse_config.primary_space.as_deref().unwrap_or("(all spaces)")
    );
    eprintln!("   Pulse API: http://0.0.0.0:{}/api/pulse", server_config.port);
    eprintln!("   Filters API: http://0.0.0.0:{}/api/pulse/filters\n", server_config.port);

    let task_source: Arc<dyn source::TaskSource> = Arc::from(source::from_config(&server_config.source));
    let app = pulse_routes(PulseState::new(task_source, pulse_config));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", server_config.port)).await?;
    tracing::info!(port = server_config.port, "Pulse server started");
    axum::serve(listener, app).await?;

    Ok(())
}
