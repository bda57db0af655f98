/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use uptask_api::{app::{build_router, AppState}, config::Config};
/// use uptask_shared::mail::{dispatcher::{MailDispatcher, RetryPolicy}, smtp::LogMailer};
/// use uptask_shared::repo::Repositories;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let (mail, _handle) =
///     MailDispatcher::spawn(Arc::new(LogMailer), RetryPolicy::default(), CancellationToken::new());
/// let state = AppState::new(Repositories::in_memory(), mail, config);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:4000").await?;
/// axum::serve(listener, build_router(state)).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uptask_shared::{mail::dispatcher::MailDispatcher, repo::Repositories};

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Entity repositories
    pub repos: Repositories,

    /// Outgoing mail queue
    pub mail: MailDispatcher,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repos: Repositories, mail: MailDispatcher, config: Config) -> Self {
        Self {
            repos,
            mail,
            config: Arc::new(config),
        }
    }

    /// Base URL of the web client, used in email links
    pub fn frontend_url(&self) -> &str {
        &self.config.api.frontend_url
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /api/
///     ├── /auth/
///     │   ├── POST /create-account
///     │   ├── POST /confirm-account
///     │   ├── POST /login
///     │   ├── POST /request-code
///     │   ├── POST /forgot-password
///     │   ├── POST /new-password
///     │   └── POST /update-password/:token
///     └── /projects/
///         ├── POST, GET /
///         ├── GET, PUT, DELETE /:projectId
///         ├── POST, GET /:projectId/tasks
///         ├── GET, PUT, DELETE /:projectId/tasks/:taskId
///         └── POST /:projectId/tasks/:taskId/status
/// ```
///
/// The project-by-id routes share the `:projectId` segment name with the task
/// routes; the router requires one parameter name per position.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/create-account", post(routes::auth::create_account))
        .route("/confirm-account", post(routes::auth::confirm_account))
        .route("/login", post(routes::auth::login))
        .route("/request-code", post(routes::auth::request_code))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/new-password", post(routes::auth::validate_token))
        .route("/update-password/:token", post(routes::auth::update_password));

    let project_routes = Router::new()
        .route(
            "/",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/:projectId",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:projectId/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/:projectId/tasks/:taskId",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:projectId/tasks/:taskId/status",
            post(routes::tasks::update_status),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Only the web client origin may call the API from a browser, unless
/// `CORS_ALLOW_ANY_ORIGIN` is set
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_allow_any_origin {
        return CorsLayer::permissive();
    }

    let origin = match config.api.frontend_url.trim_end_matches('/').parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            tracing::warn!(frontend_url = %config.api.frontend_url, "FRONTEND_URL is not a valid origin");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
