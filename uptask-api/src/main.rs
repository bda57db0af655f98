//! # UpTask API Server
//!
//! ## Usage
//!
//! ```bash
//! FRONTEND_URL=http://localhost:5173 STORAGE=memory cargo run -p uptask-api
//! ```
//!
//! See [`uptask_api::config`] for every setting.

use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uptask_api::{
    app::{build_router, AppState},
    config::{Config, StorageConfig},
};
use uptask_shared::{
    auth::token::run_purge_loop,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    mail::{
        dispatcher::{MailDispatcher, RetryPolicy},
        smtp::{LogMailer, SmtpMailer},
        Mailer,
    },
    repo::Repositories,
};

const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "uptask_api=debug,uptask_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("UpTask API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let (repos, pool) = match &config.storage {
        StorageConfig::Postgres {
            url,
            max_connections,
        } => {
            let pool = create_pool(DatabaseConfig {
                url: url.clone(),
                max_connections: *max_connections,
                ..Default::default()
            })
            .await?;
            run_migrations(&pool).await?;
            (Repositories::postgres(pool.clone()), Some(pool))
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            (Repositories::in_memory(), None)
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(settings) => Arc::new(SmtpMailer::new(settings)?),
        None => {
            tracing::warn!("SMTP_HOST not set; emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let shutdown = CancellationToken::new();
    let (mail, mail_handle) = MailDispatcher::spawn(mailer, RetryPolicy::default(), shutdown.clone());
    let purge_handle = tokio::spawn(run_purge_loop(
        repos.tokens.clone(),
        TOKEN_PURGE_INTERVAL,
        shutdown.clone(),
    ));

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(repos, mail, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, draining background work...");
    shutdown.cancel();
    let _ = tokio::join!(mail_handle, purge_handle);

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
