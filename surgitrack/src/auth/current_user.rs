use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
};

/// Extract user from a bearer JWT in the Authorization header if present
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(user)): Valid token found and verified
/// - Some(Err(error)): Bearer token present but invalid/expired
#[instrument(skip(parts, config))]
fn try_bearer_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    let token = auth_str.strip_prefix("Bearer ")?;

    Some(session::verify_session_token(token, config))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_bearer_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found bearer authenticated user: {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => {
                trace!("Bearer authentication failed: {:?}", e);
                Err(Error::Unauthenticated { message: None })
            }
            None => {
                trace!("No authentication credentials found in request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::users::Role,
        test_utils::{create_test_app_state, create_test_config},
    };
    use axum::extract::FromRequestParts as _;
    use sqlx::PgPool;

    fn create_test_parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    fn create_test_parts_without_headers() -> Parts {
        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (parts, _body) = request.into_parts();
        parts
    }

    #[sqlx::test]
    async fn test_valid_bearer_token_extraction(pool: PgPool) {
        let config = create_test_config();
        let state = create_test_app_state(pool, config.clone()).await;

        let user = CurrentUser {
            id: "D-1001".to_string(),
            name: "张伟".to_string(),
            role: Role::Doctor,
        };
        let token = session::create_session_token(&user, &config).unwrap();

        let mut parts = create_test_parts_with_header("authorization", &format!("Bearer {token}"));

        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.id, "D-1001");
        assert_eq!(extracted.name, "张伟");
        assert_eq!(extracted.role, Role::Doctor);
    }

    #[sqlx::test]
    async fn test_missing_header_rejected(pool: PgPool) {
        let config = create_test_config();
        let state = create_test_app_state(pool, config).await;

        let mut parts = create_test_parts_without_headers();

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }

    #[sqlx::test]
    async fn test_garbage_token_rejected(pool: PgPool) {
        let config = create_test_config();
        let state = create_test_app_state(pool, config).await;

        let mut parts = create_test_parts_with_header("authorization", "Bearer not-a-real-token");

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }

    #[sqlx::test]
    async fn test_non_bearer_scheme_rejected(pool: PgPool) {
        let config = create_test_config();
        let state = create_test_app_state(pool, config).await;

        let mut parts = create_test_parts_with_header("authorization", "Basic dXNlcjpwYXNz");

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }
}
