//! # surgitrack: Surgical Equipment and Case Tracking
//!
//! `surgitrack` is the backend service for a hospital's robotic-surgery
//! programme. It tracks the operating theatre's reusable instruments and
//! single-use consumable stock, records surgeries against the staff and
//! equipment involved, and carries the staff message box used to reach the
//! equipment administrators.
//!
//! ## Overview
//!
//! Robotic surgical instruments are certified for a fixed number of uses
//! before they must be retired, and the sterile consumables that accompany
//! them are tracked per physical unit from restocking to use. Keeping those
//! counters honest by hand is error-prone, so this service makes the surgery
//! record the single source of truth: recording a case decrements the
//! instruments it used and draws tagged units out of consumable stock in the
//! same transaction.
//!
//! The system is aimed at a single surgical department's equipment nurses,
//! surgeons and administrators. Staff authenticate with their badge or phone
//! number, and what they may do is decided by their role.
//!
//! ### What It Does
//!
//! At its core, `surgitrack` exposes a JSON HTTP API for four resources:
//! instruments (register in batches, revise, decrement usage counters),
//! consumables (restock, query fresh stock per product name, tag units as
//! used), surgeries (record a case with its staff, instruments and
//! consumables; the side effects on equipment happen atomically with the
//! record), and messages (staff leave notes for administrators, who review
//! them with a status and feedback). Administrators manage staff accounts and
//! seed the initial administrator from configuration on startup.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for all persistence. Entity ids are
//! handed out by an in-database allocator so that instruments, consumable
//! units, surgeries and messages get small sequential numbers that fit on a
//! printed label.
//!
//! ### Request Flow
//!
//! A request to `/api/v1/*` carries a JWT bearer token obtained from
//! `/authentication/login`. The token is verified by an extractor that
//! produces the current user, handlers check the user's role against the
//! operation, and then interact with the database through repository
//! interfaces. Mutations that touch stock run inside a transaction so a
//! failed surgery record never half-consumes equipment. After instruments
//! are registered, label artifacts are generated for printing by the
//! configured artifact backend.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the management routes under
//! `/api/v1/*` plus the authentication routes at the root. Handlers are
//! annotated for OpenAPI generation and the interactive documentation is
//! served at `/docs`.
//!
//! The **authentication layer** ([`auth`]) hashes passwords with Argon2,
//! issues and verifies the JWT session tokens, and holds the role/permission
//! table consulted by handlers.
//!
//! The **database layer** ([`db`]) uses the repository pattern to abstract
//! data access. Each entity has a repository handling queries and mutations;
//! cross-entity flows (surgery recording, stock allocation) compose
//! repositories inside one transaction.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use surgitrack::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = surgitrack::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize structured logging
//!     surgitrack::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! // Run migrations
//! surgitrack::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
//!
pub mod api;
pub mod artifacts;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    artifacts::ArtifactGenerator,
    auth::password,
    db::handlers::{Repository, Users},
    db::models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    openapi::ApiDoc,
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{ConsumableId, InstrumentId, MessageId, SurgeryId, UserId};

/// Application state shared across all request handlers.
///
/// This struct contains the shared resources needed by the API handlers:
/// the database connection pool, the loaded configuration, and the label
/// artifact generator invoked after instrument registration.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .artifacts(artifacts)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub artifacts: Arc<dyn ArtifactGenerator>,
}

/// Get the surgitrack database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial administrator account if it doesn't exist.
///
/// This function is idempotent - it will create a new administrator if one
/// doesn't exist, or rotate the password if the account is already present.
/// It is called during application startup so an administrator is always
/// available to register the rest of the staff.
///
/// # Arguments
///
/// - `id`: Staff id for the administrator (badge or phone number)
/// - `name`: Display name for the administrator
/// - `password`: Password to set (or reset) for the account
/// - `db`: PostgreSQL connection pool
///
/// # Returns
///
/// Returns the staff id of the created or existing administrator.
///
/// # Errors
///
/// Returns an error if password hashing or database operations fail.
///
/// # Example
///
/// ```no_run
/// # use surgitrack::create_initial_admin_user;
/// # use sqlx::PgPool;
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user_id = create_initial_admin_user("admin", "系统管理员", "secure_password", &pool).await?;
/// # Ok(())
/// # }
/// ```
#[instrument(skip_all)]
pub async fn create_initial_admin_user(id: &str, name: &str, password: &str, db: &PgPool) -> Result<UserId, sqlx::Error> {
    let password_hash =
        password::hash_string(password).map_err(|e| sqlx::Error::Encode(format!("Failed to hash admin password: {e}").into()))?;

    // Use a transaction to ensure atomicity
    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    // Check if the account already exists
    if let Some(existing_user) = user_repo
        .get_by_id(id.to_string())
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to check existing user: {e}")))?
    {
        let update = UserUpdateDBRequest {
            password_hash: Some(password_hash),
            ..Default::default()
        };
        user_repo
            .update(id.to_string(), &update)
            .await
            .map_err(|e| sqlx::Error::Protocol(format!("Failed to update admin password: {e}")))?;
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    // Create new administrator account
    let user_create = UserCreateDBRequest {
        id: id.to_string(),
        name: name.to_string(),
        role: Role::Administrator,
        password_hash,
    };

    let created_user = user_repo
        .create(&user_create)
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to create admin user: {e}")))?;

    tx.commit().await?;
    Ok(created_user.id)
}

/// Setup the database pool, run migrations, and seed the initial administrator
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.pool.max_connections)
        .min_connections(config.database.pool.min_connections)
        .acquire_timeout(config.database.pool.acquire_timeout)
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;

    match config.admin_password.as_deref() {
        Some(password) => {
            let admin_id = create_initial_admin_user(&config.admin_id, &config.admin_name, password, &pool)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;
            info!("Initial administrator account ready (id: {})", admin_id);
        }
        None => {
            warn!("admin_password is not set; skipping initial administrator seeding");
        }
    }

    Ok(pool)
}

/// Build the application router.
///
/// Assembles the authentication routes at the root, the management API under
/// `/api/v1`, the unauthenticated health endpoint, and the OpenAPI
/// documentation, then applies the CORS and tracing layers.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> Router {
    // Authentication routes (at root level)
    let auth_routes = Router::new()
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/me", get(api::handlers::auth::me))
        .route("/authentication/register", post(api::handlers::auth::register))
        .with_state(state.clone());

    // API routes
    let api_routes = Router::new()
        // Staff accounts (admin only for mutations)
        .route("/users", get(api::handlers::users::list_users))
        .route("/users/{id}", get(api::handlers::users::get_user))
        .route("/users/{id}", put(api::handlers::users::update_user))
        .route("/users/{id}", delete(api::handlers::users::delete_user))
        // Instruments
        .route("/instruments", get(api::handlers::instruments::list_instruments))
        .route("/instruments", post(api::handlers::instruments::register_instruments))
        .route("/instruments", delete(api::handlers::instruments::delete_instruments))
        .route("/instruments/{id}", get(api::handlers::instruments::get_instrument))
        .route("/instruments/{id}", put(api::handlers::instruments::update_instrument))
        .route("/instruments/{id}", delete(api::handlers::instruments::delete_instrument))
        .route("/instruments/{id}/decrement", post(api::handlers::instruments::decrement_instrument))
        // Consumable stock
        .route("/consumables", get(api::handlers::consumables::list_consumables))
        .route("/consumables", post(api::handlers::consumables::restock_consumables))
        .route("/consumables", delete(api::handlers::consumables::delete_consumables))
        .route("/consumables/stock", get(api::handlers::consumables::get_stock_levels))
        .route("/consumables/{id}/tag", post(api::handlers::consumables::tag_consumable))
        .route("/consumables/{id}", get(api::handlers::consumables::get_consumable))
        .route("/consumables/{id}", delete(api::handlers::consumables::delete_consumable))
        // Surgery records
        .route("/surgeries", get(api::handlers::surgeries::list_surgeries))
        .route("/surgeries", post(api::handlers::surgeries::record_surgery))
        .route("/surgeries", delete(api::handlers::surgeries::delete_surgeries))
        .route("/surgeries/{id}", get(api::handlers::surgeries::get_surgery))
        .route("/surgeries/{id}", put(api::handlers::surgeries::update_surgery))
        .route("/surgeries/{id}", delete(api::handlers::surgeries::delete_surgery))
        // Staff message box
        .route("/messages", get(api::handlers::messages::list_messages))
        .route("/messages", post(api::handlers::messages::create_message))
        .route("/messages", delete(api::handlers::messages::delete_messages))
        .route("/messages/{id}", put(api::handlers::messages::review_message))
        .route("/messages/{id}", delete(api::handlers::messages::delete_message))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to PostgreSQL, runs
///    migrations, seeds the initial administrator, and assembles the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests
///    drain and the connection pool is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting equipment tracking service with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let artifacts = artifacts::create_generator(&config.artifacts);

        let state = AppState::builder().db(pool.clone()).config(config.clone()).artifacts(artifacts).build();

        let router = build_router(&state);

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Equipment tracking service listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::create_initial_admin_user;
    use crate::{
        api::models::auth::LoginResponse,
        api::models::consumables::StockLevelResponse,
        api::models::instruments::InstrumentResponse,
        api::models::users::Role,
        auth::password,
        db::handlers::{Repository, Users},
        db::models::users::UserFilter,
        test_utils::*,
    };
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_creates_administrator(pool: PgPool) {
        let admin_id = create_initial_admin_user("admin", "系统管理员", "hunter2", &pool).await.unwrap();
        assert_eq!(admin_id, "admin");

        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        let admin = users.get_by_id("admin".to_string()).await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Administrator);
        assert_eq!(admin.name, "系统管理员");
        assert!(password::verify_string("hunter2", &admin.password_hash).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_rotates_password(pool: PgPool) {
        let first = create_initial_admin_user("admin", "系统管理员", "first-password", &pool).await.unwrap();
        let second = create_initial_admin_user("admin", "系统管理员", "second-password", &pool).await.unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        let admins = users.list(&UserFilter::new().role(Role::Administrator)).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert!(password::verify_string("second-password", &admins[0].password_hash).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_health_and_docs_are_public(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_text("OK");

        let response = server.get("/docs").await;
        response.assert_status_ok();

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_api_requires_authentication(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/api/v1/instruments").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    /// Integration test: restock consumables, register an instrument, then
    /// record a surgery over HTTP and check the equipment side effects.
    #[sqlx::test]
    #[test_log::test]
    async fn test_surgery_recording_flow(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();

        let admin = create_test_admin(&pool).await;
        let nurse = create_test_user(&pool, Role::Nurse).await;
        let doctor = create_test_user(&pool, Role::Doctor).await;

        // Login over HTTP as the administrator
        let response = server
            .post("/authentication/login")
            .json(&serde_json::json!({"id": admin.id, "password": TEST_PASSWORD}))
            .await;
        response.assert_status_ok();
        let login: LoginResponse = response.json();
        let admin_auth = format!("Bearer {}", login.token);

        // Restock three units of a consumable
        let response = server
            .post("/api/v1/consumables")
            .add_header("authorization", &admin_auth)
            .json(&serde_json::json!({"name": "无菌壁套", "count": 3}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        // Register one instrument with a single use left
        let response = server
            .post("/api/v1/instruments")
            .add_header("authorization", &admin_auth)
            .json(&serde_json::json!({"names": ["持针钳"], "remaining_uses": 1}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let instruments: Vec<InstrumentResponse> = response.json();
        let instrument_id = instruments[0].id;

        // A nurse records the surgery, naming staff by display name
        let response = server
            .post("/api/v1/surgeries")
            .add_header("authorization", bearer(&nurse, &config))
            .json(&serde_json::json!({
                "patient_name": "陈某",
                "admission_number": 20260042,
                "department": "泌尿外科",
                "procedure_name": "肾部分切除术",
                "begin_time": "2026-03-14T09:00:00Z",
                "end_time": "2026-03-14T11:30:00Z",
                "chief_surgeon": doctor.name,
                "instrument_nurses": [nurse.name],
                "instruments": [{"id": instrument_id, "description": "一号臂"}],
                "consumables": [{"name": "无菌壁套", "description": "术中更换"}]
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        // The instrument's usage counter dropped to zero
        let response = server
            .get(&format!("/api/v1/instruments/{instrument_id}"))
            .add_header("authorization", &admin_auth)
            .await;
        response.assert_status_ok();
        let instrument: InstrumentResponse = response.json();
        assert_eq!(instrument.remaining_uses, 0);

        // One unit was drawn from stock, leaving two fresh
        let response = server.get("/api/v1/consumables/stock").add_header("authorization", &admin_auth).await;
        response.assert_status_ok();
        let stock: Vec<StockLevelResponse> = response.json();
        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].name, "无菌壁套");
        assert_eq!(stock[0].fresh, 2);
    }
}
