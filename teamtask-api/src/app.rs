//! Application state and router builder
//!
//! # Routes
//!
//! ```text
//! /
//! ├── GET  /health                    public
//! ├── POST /auth/register             public
//! ├── POST /auth/login                public
//! ├── /tasks
//! │   ├── POST /assign                manager
//! │   ├── GET  /assigned              manager
//! │   ├── GET  /analytics/manager     manager
//! │   ├── GET  /my                    member
//! │   ├── PUT  /start/:id             member
//! │   ├── PUT  /submit/:id            member
//! │   └── GET  /analytics/member      member
//! └── /users
//!     ├── GET  /profile               any signed-in user
//!     └── GET  /team                  manager
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use teamtask_api::{app::{build_router, AppState}, config::Config};
//! use teamtask_shared::{clock::SystemClock, store::Stores, upload::StubUploader};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let state = AppState::new(
//!     config,
//!     Stores::in_memory(),
//!     Arc::new(StubUploader::new()),
//!     Arc::new(SystemClock),
//! );
//! let app = build_router(state);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::routes;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use teamtask_shared::{
    auth::{
        jwt::TokenIssuer,
        middleware::{jwt_auth, role_guard},
    },
    clock::Clock,
    models::user::Role,
    services::{AccountService, AnalyticsService, LifecyclePolicy, TaskLifecycleService},
    store::Stores,
    upload::ProofUploader,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub tokens: Arc<TokenIssuer>,
    pub accounts: AccountService,
    pub lifecycle: TaskLifecycleService,
    pub analytics: AnalyticsService,
}

impl AppState {
    /// Wires services over the given stores, uploader and clock
    pub fn new(
        config: Config,
        stores: Stores,
        uploader: Arc<dyn ProofUploader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = Arc::new(TokenIssuer::new(&config.jwt.secret, config.token_ttl()));
        let policy = LifecyclePolicy {
            require_start_before_submit: config.tasks.require_start_before_submit,
        };

        Self {
            accounts: AccountService::new(
                stores.clone(),
                uploader.clone(),
                clock.clone(),
                tokens.clone(),
            ),
            lifecycle: TaskLifecycleService::new(stores.clone(), uploader, clock, policy),
            analytics: AnalyticsService::new(stores.clone()),
            config: Arc::new(config),
            stores,
            tokens,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login));

    // Role gate runs inside jwt_auth, which is the outer layer
    let manager_routes = Router::new()
        .route("/tasks/assign", post(routes::tasks::assign_task))
        .route("/tasks/assigned", get(routes::tasks::list_assigned_tasks))
        .route(
            "/tasks/analytics/manager",
            get(routes::analytics::manager_analytics),
        )
        .route("/users/team", get(routes::users::team_members))
        .layer(from_fn_with_state(Role::Manager, role_guard))
        .layer(from_fn_with_state(state.tokens.clone(), jwt_auth));

    let member_routes = Router::new()
        .route("/tasks/my", get(routes::tasks::list_my_tasks))
        .route("/tasks/start/:id", put(routes::tasks::start_task))
        .route("/tasks/submit/:id", put(routes::tasks::submit_task))
        .route(
            "/tasks/analytics/member",
            get(routes::analytics::member_analytics),
        )
        .layer(from_fn_with_state(Role::Member, role_guard))
        .layer(from_fn_with_state(state.tokens.clone(), jwt_auth));

    let signed_in_routes = Router::new()
        .route("/users/profile", get(routes::users::profile))
        .layer(from_fn_with_state(state.tokens.clone(), jwt_auth));

    Router::new()
        .merge(public_routes)
        .merge(manager_routes)
        .merge(member_routes)
        .merge(signed_in_routes)
        .layer(DefaultBodyLimit::max(state.config.api.body_limit_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}
