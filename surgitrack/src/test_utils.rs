//! Test utilities for integration testing (available with `test-utils` feature).

use crate::api::models::users::{CurrentUser, Role};
use crate::artifacts::NoopArtifacts;
use crate::auth::{password, session};
use crate::config::{ArtifactsConfig, Config};
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse};
use crate::{AppState, build_router};
use axum_test::TestServer;
use sqlx::PgPool;
use std::sync::{Arc, OnceLock};

/// Password shared by every account created through these helpers.
pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

static TEST_PASSWORD_HASH: OnceLock<String> = OnceLock::new();

/// Argon2 hash of [`TEST_PASSWORD`], computed once per test process.
fn test_password_hash() -> String {
    TEST_PASSWORD_HASH
        .get_or_init(|| password::hash_string(TEST_PASSWORD).expect("Failed to hash test password"))
        .clone()
}

pub fn create_test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        artifacts: ArtifactsConfig::Disabled,
        ..Default::default()
    }
}

pub async fn create_test_app_state(pool: PgPool, config: Config) -> AppState {
    AppState::builder().db(pool).config(config).artifacts(Arc::new(NoopArtifacts)).build()
}

/// Build a [`TestServer`] around the full router, backed by the given pool.
///
/// Migrations are expected to have run already (`#[sqlx::test]` does this).
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let state = create_test_app_state(pool, create_test_config()).await;
    let router = build_router(&state);
    TestServer::new(router).expect("Failed to create test server")
}

/// Insert a staff account with the given role and a unique id and name.
pub async fn create_test_user(pool: &PgPool, role: Role) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let suffix = rand::random::<u32>();

    let user_create = UserCreateDBRequest {
        id: format!("T{suffix:08}"),
        name: format!("测试职员{suffix:08}"),
        role,
        password_hash: test_password_hash(),
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

pub async fn create_test_admin(pool: &PgPool) -> UserDBResponse {
    create_test_user(pool, Role::Administrator).await
}

/// `Authorization` header value carrying a fresh session token for the account.
pub fn bearer(user: &UserDBResponse, config: &Config) -> String {
    let token = session::create_session_token(&CurrentUser::from(user.clone()), config).expect("Failed to create session token");
    format!("Bearer {token}")
}
