//! Authentication handlers: login, current-user lookup, staff registration.

use crate::{
    AppState,
    api::models::{
        auth::{LoginRequest, LoginResponse},
        users::{CurrentUser, UserCreate, UserResponse},
    },
    auth::{password, permissions, session},
    config::Config,
    db::handlers::{Repository, Users},
    db::models::users::UserCreateDBRequest,
    errors::{Error, Result},
    types::{Operation, Resource},
};
use axum::{Json, extract::State, http::StatusCode};

/// Check a candidate password against the configured length bounds.
pub(crate) fn validate_password(candidate: &str, config: &Config) -> Result<()> {
    let length = candidate.chars().count();
    if length < config.auth.password.min_length || length > config.auth.password.max_length {
        return Err(Error::BadRequest {
            message: format!(
                "Password must be between {} and {} characters",
                config.auth.password.min_length, config.auth.password.max_length
            ),
        });
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/authentication/login",
    tag = "authentication",
    summary = "Login",
    description = "Authenticate with a staff id and password, returning a session token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid staff id or password"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    // Unknown ids and wrong passwords get the same answer
    let user = users.get_by_id(request.id.clone()).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid staff id or password".to_string()),
    })?;

    let valid = password::verify_string_blocking(request.password, user.password_hash.clone()).await?;
    if !valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid staff id or password".to_string()),
        });
    }

    let token = session::create_session_token(&CurrentUser::from(user.clone()), &state.config)?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

#[utoipa::path(
    get,
    path = "/authentication/me",
    tag = "authentication",
    summary = "Current user",
    description = "Return the account behind the presented session token",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    // A token can outlive its account; re-check the row instead of
    // trusting the claims.
    let user = users.get_by_id(current_user.id.clone()).await?.ok_or(Error::Unauthenticated {
        message: Some("Account no longer exists".to_string()),
    })?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/authentication/register",
    tag = "authentication",
    summary = "Register staff account",
    description = "Create a staff account with a role and initial password. Administrators only.",
    request_body = UserCreate,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 409, description = "A user with this staff id already exists"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    permissions::require(&current_user, Resource::Users, Operation::Create)?;

    if request.id.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Staff id must not be empty".to_string(),
        });
    }
    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Name must not be empty".to_string(),
        });
    }
    validate_password(&request.password, &state.config)?;

    let password_hash = password::hash_string_blocking(request.password).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let user = users
        .create(&UserCreateDBRequest {
            id: request.id,
            name: request.name,
            role: request.role,
            password_hash,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{auth::LoginResponse, users::Role, users::UserResponse},
        db::handlers::{Repository, Users},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_returns_token_and_user(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::Doctor).await;

        let response = server
            .post("/authentication/login")
            .json(&json!({"id": user.id, "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let login: LoginResponse = response.json();
        assert!(!login.token.is_empty());
        assert_eq!(login.user.id, user.id);
        assert_eq!(login.user.role, Role::Doctor);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_rejects_wrong_password(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::Nurse).await;

        let response = server
            .post("/authentication/login")
            .json(&json!({"id": user.id, "password": "not-the-password"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_rejects_unknown_id(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/authentication/login")
            .json(&json!({"id": "nobody", "password": TEST_PASSWORD}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_returns_current_account(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let user = create_test_user(&pool, Role::Doctor).await;

        let response = server.get("/authentication/me").add_header("authorization", bearer(&user, &config)).await;

        response.assert_status_ok();
        let me: UserResponse = response.json();
        assert_eq!(me.id, user.id);
        assert_eq!(me.name, user.name);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_rejects_token_of_deleted_account(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let user = create_test_user(&pool, Role::Doctor).await;
        let auth = bearer(&user, &config);

        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        assert!(users.delete(user.id).await.unwrap());

        let response = server.get("/authentication/me").add_header("authorization", auth).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_requires_administrator(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let nurse = create_test_user(&pool, Role::Nurse).await;

        let response = server
            .post("/authentication/register")
            .add_header("authorization", bearer(&nurse, &config))
            .json(&json!({"id": "D-2001", "name": "李医生", "role": "doctor", "password": "initial-pass"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_creates_account_that_can_login(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;

        let response = server
            .post("/authentication/register")
            .add_header("authorization", bearer(&admin, &config))
            .json(&json!({"id": "D-2001", "name": "李医生", "role": "医生", "password": "initial-pass"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created: UserResponse = response.json();
        assert_eq!(created.id, "D-2001");
        assert_eq!(created.role, Role::Doctor);

        let response = server
            .post("/authentication/login")
            .json(&json!({"id": "D-2001", "password": "initial-pass"}))
            .await;
        response.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_rejects_duplicate_staff_id(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let existing = create_test_user(&pool, Role::Doctor).await;

        let response = server
            .post("/authentication/register")
            .add_header("authorization", bearer(&admin, &config))
            .json(&json!({"id": existing.id, "name": "重复账号", "role": "doctor", "password": "initial-pass"}))
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_rejects_short_password(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;

        let response = server
            .post("/authentication/register")
            .add_header("authorization", bearer(&admin, &config))
            .json(&json!({"id": "D-2002", "name": "王医生", "role": "doctor", "password": "abc"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
