mod api;
mod middleware;

use std::{net::SocketAddr, sync::Arc};

use souq_backend::BackendClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limits, AppState, Storefront},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = souq_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let categories = souq_core::load_categories(&config.categories_path)?;
    tracing::info!(
        count = categories.categories.len(),
        path = %config.categories_path.display(),
        "loaded categories"
    );

    let backend = Arc::new(BackendClient::from_app_config(&config)?);
    let auth = AuthState::from_env(matches!(
        config.env,
        souq_core::Environment::Development
    ))?;

    let state = AppState {
        products: backend.clone(),
        sessions: backend,
        storefront: Arc::new(Storefront::from_app_config(&config, categories)),
    };
    let app = build_app(state, auth, default_rate_limits());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "souq-server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
