use std::sync::Arc;

use electoral_forecast::registry::StateModelRegistry;
use electoral_forecast::server::create_router;

#[tokio::main]
async fn main() {
    electoral_forecast::env_config::init_tracing();
    let port = electoral_forecast::env_config::server_port();
    electoral_forecast::env_config::init_rayon_threads_lenient();
    println!("Starting electoral forecast API server...");

    let registry = Arc::new(StateModelRegistry::baseline());
    println!("Registry loaded: {} voting units", registry.len());
    let app = create_router(registry);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind port {}: {}", port, e);
            std::process::exit(1);
        }
    };
    println!("Server is running on port {}. Press Ctrl+C to stop.", port);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }

    println!("\nStopping server...");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install CTRL+C signal handler");
    }
}
