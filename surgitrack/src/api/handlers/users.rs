//! Staff account handlers.
//!
//! Listing and lookup are open to any authenticated staff member.
//! Mutations are administrator-only, with one exception: everyone may
//! revise their own display name and password.

use crate::{
    AppState,
    api::handlers::auth::validate_password,
    api::models::users::{CurrentUser, ListUsersQuery, UserResponse, UserUpdate},
    auth::{password, permissions},
    db::handlers::{Repository, Users},
    db::models::users::{UserFilter, UserUpdateDBRequest},
    errors::{Error, Result},
    types::{Operation, Resource, UserId},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List staff accounts",
    description = "List staff accounts, optionally filtered by display name or role",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of staff accounts", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    _current_user: CurrentUser,
) -> Result<Json<Vec<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let filter = UserFilter::from(&query);
    let accounts = users.list(&filter).await?;

    Ok(Json(accounts.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get staff account",
    params(
        ("id" = String, Path, description = "Staff id"),
    ),
    responses(
        (status = 200, description = "Staff account", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    _current_user: CurrentUser,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let user = users.get_by_id(id.clone()).await?.ok_or(Error::NotFound {
        resource: Resource::Users,
        id,
    })?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    summary = "Update staff account",
    description = "Revise a staff account. Administrators may change anything including the \
                   staff id; other staff may only change their own name and password.",
    params(
        ("id" = String, Path, description = "Staff id"),
    ),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated staff account", body = UserResponse),
        (status = 400, description = "Invalid request data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "A user with the new staff id already exists"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    current_user: CurrentUser,
    Json(request): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    if !current_user.is_administrator() {
        // Role and staff-id changes stay with the administrators, as does
        // touching anyone else's account.
        if id != current_user.id || request.role.is_some() || request.new_id.is_some() {
            return Err(Error::InsufficientPermissions {
                action: Operation::Update,
                resource: Resource::Users,
            });
        }
    }

    let password_hash = match request.password {
        Some(candidate) => {
            validate_password(&candidate, &state.config)?;
            Some(password::hash_string_blocking(candidate).await?)
        }
        None => None,
    };

    let update = UserUpdateDBRequest {
        name: request.name,
        role: request.role,
        password_hash,
        new_id: request.new_id,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    let user = users.update(id, &update).await?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete staff account",
    description = "Remove a staff account. Administrators only.",
    params(
        ("id" = String, Path, description = "Staff id"),
    ),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<UserId>, current_user: CurrentUser) -> Result<StatusCode> {
    permissions::require(&current_user, Resource::Users, Operation::Delete)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    if !users.delete(id.clone()).await? {
        return Err(Error::NotFound {
            resource: Resource::Users,
            id,
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::users::{Role, UserResponse},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_users_filters_by_role(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        create_test_user(&pool, Role::Doctor).await;
        create_test_user(&pool, Role::Nurse).await;

        let response = server
            .get("/api/v1/users?role=doctor")
            .add_header("authorization", bearer(&admin, &config))
            .await;

        response.assert_status_ok();
        let users: Vec<UserResponse> = response.json();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Doctor);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_user_returns_404_for_unknown_id(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;

        let response = server
            .get("/api/v1/users/nobody")
            .add_header("authorization", bearer(&admin, &config))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_user_can_change_own_name_and_password(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let doctor = create_test_user(&pool, Role::Doctor).await;

        let response = server
            .put(&format!("/api/v1/users/{}", doctor.id))
            .add_header("authorization", bearer(&doctor, &config))
            .json(&json!({"name": "张主任", "password": "fresh-password"}))
            .await;

        response.assert_status_ok();
        let updated: UserResponse = response.json();
        assert_eq!(updated.name, "张主任");

        // The old password no longer works, the new one does
        let response = server
            .post("/authentication/login")
            .json(&json!({"id": doctor.id, "password": TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/authentication/login")
            .json(&json!({"id": doctor.id, "password": "fresh-password"}))
            .await;
        response.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_user_cannot_change_own_role(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let doctor = create_test_user(&pool, Role::Doctor).await;

        let response = server
            .put(&format!("/api/v1/users/{}", doctor.id))
            .add_header("authorization", bearer(&doctor, &config))
            .json(&json!({"role": "administrator"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_user_cannot_update_someone_else(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let doctor = create_test_user(&pool, Role::Doctor).await;
        let nurse = create_test_user(&pool, Role::Nurse).await;

        let response = server
            .put(&format!("/api/v1/users/{}", nurse.id))
            .add_header("authorization", bearer(&doctor, &config))
            .json(&json!({"name": "改名"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_can_reassign_staff_id(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let doctor = create_test_user(&pool, Role::Doctor).await;

        let response = server
            .put(&format!("/api/v1/users/{}", doctor.id))
            .add_header("authorization", bearer(&admin, &config))
            .json(&json!({"new_id": "D-9999"}))
            .await;

        response.assert_status_ok();
        let updated: UserResponse = response.json();
        assert_eq!(updated.id, "D-9999");

        // The old id is gone
        let response = server
            .get(&format!("/api/v1/users/{}", doctor.id))
            .add_header("authorization", bearer(&admin, &config))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user_is_admin_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let doctor = create_test_user(&pool, Role::Doctor).await;
        let nurse = create_test_user(&pool, Role::Nurse).await;

        let response = server
            .delete(&format!("/api/v1/users/{}", doctor.id))
            .add_header("authorization", bearer(&nurse, &config))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .delete(&format!("/api/v1/users/{}", doctor.id))
            .add_header("authorization", bearer(&admin, &config))
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = server
            .delete(&format!("/api/v1/users/{}", doctor.id))
            .add_header("authorization", bearer(&admin, &config))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
