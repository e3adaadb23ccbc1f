use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use birth_registry::config::AppConfig;
use birth_registry::domain::AuthState;
use birth_registry::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    info!("Starting birth registry with {:?}", config);

    let app_state = initialize_backend(&config).await?;

    // Audit trail of sign-ins and sign-outs, held for the life of the server
    let _auth_audit = app_state.auth_hub.subscribe(|state| match state {
        AuthState::SignedIn(actor) => info!(
            "Auth state: signed in as {} ({}), admin: {}",
            actor.uid, actor.email, actor.is_admin
        ),
        AuthState::SignedOut => info!("Auth state: signed out"),
    });

    let app = create_router(app_state, &config.public_origin)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
