//! Staff message box handlers.
//!
//! Doctors post equipment and maintenance notes; administrators review
//! them, adjusting status and priority and leaving feedback. Staff
//! other than administrators only ever see their own submissions.

use crate::{
    AppState,
    api::models::BulkDeleteResponse,
    api::models::messages::{
        DeleteMessagesQuery, ListMessagesQuery, MessageCreate, MessagePriority, MessageResponse, MessageReview,
    },
    api::models::users::CurrentUser,
    auth::permissions,
    db::handlers::{Messages, Repository},
    db::models::messages::{MessageCreateDBRequest, MessageFilter, MessageUpdateDBRequest},
    errors::{Error, Result},
    types::{MessageId, Operation, Resource},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/messages",
    tag = "messages",
    summary = "List messages",
    description = "List messages, optionally filtered by sender, review state, priority or \
                   posting time. Administrators see every message; other staff see only their own.",
    params(ListMessagesQuery),
    responses(
        (status = 200, description = "List of messages", body = [MessageResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ListMessagesQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<MessageResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut messages = Messages::new(&mut conn);

    let mut filter = MessageFilter::from(&query);
    if !current_user.is_administrator() {
        filter.sender_ids = Some(vec![current_user.id.clone()]);
    }
    let records = messages.list(&filter).await?;

    Ok(Json(records.into_iter().map(MessageResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/messages",
    tag = "messages",
    summary = "Post a message",
    description = "Post a note to the administrators, stamped with the sender's staff id and \
                   name. Doctors and administrators only.",
    request_body = MessageCreate,
    responses(
        (status = 201, description = "The posted message", body = MessageResponse),
        (status = 400, description = "Invalid request data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_message(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<MessageCreate>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    permissions::require(&current_user, Resource::Messages, Operation::Create)?;

    if request.content.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Message content must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut messages = Messages::new(&mut conn);

    let message = messages
        .create(&MessageCreateDBRequest {
            sender_id: current_user.id.clone(),
            sender_name: current_user.name.clone(),
            content: request.content,
            priority: request.priority.unwrap_or(MessagePriority::Normal),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

#[utoipa::path(
    put,
    path = "/messages/{id}",
    tag = "messages",
    summary = "Review a message",
    description = "Advance a message's review state, adjust its priority, or leave feedback \
                   for the sender. Administrators only.",
    params(
        ("id" = i64, Path, description = "Message id"),
    ),
    request_body = MessageReview,
    responses(
        (status = 200, description = "The reviewed message", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Message not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn review_message(
    State(state): State<AppState>,
    Path(id): Path<MessageId>,
    current_user: CurrentUser,
    Json(request): Json<MessageReview>,
) -> Result<Json<MessageResponse>> {
    permissions::require(&current_user, Resource::Messages, Operation::Review)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut messages = Messages::new(&mut conn);

    let message = messages
        .update(
            id,
            &MessageUpdateDBRequest {
                status: request.status,
                priority: request.priority,
                feedback: request.feedback,
            },
        )
        .await?;

    Ok(Json(MessageResponse::from(message)))
}

#[utoipa::path(
    delete,
    path = "/messages/{id}",
    tag = "messages",
    summary = "Delete message",
    description = "Remove one message. Administrators only.",
    params(
        ("id" = i64, Path, description = "Message id"),
    ),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Message not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<MessageId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    permissions::require(&current_user, Resource::Messages, Operation::Delete)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut messages = Messages::new(&mut conn);

    if !messages.delete(id).await? {
        return Err(Error::NotFound {
            resource: Resource::Messages,
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/messages",
    tag = "messages",
    summary = "Delete messages by filter",
    description = "Remove every message matching the filter. At least one filter parameter is \
                   required. Administrators only.",
    params(DeleteMessagesQuery),
    responses(
        (status = 200, description = "Number of messages deleted", body = BulkDeleteResponse),
        (status = 400, description = "No filter parameters supplied"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_messages(
    State(state): State<AppState>,
    Query(query): Query<DeleteMessagesQuery>,
    current_user: CurrentUser,
) -> Result<Json<BulkDeleteResponse>> {
    permissions::require(&current_user, Resource::Messages, Operation::Delete)?;

    if query.is_empty() {
        return Err(Error::BadRequest {
            message: "Refusing to delete all messages: supply at least one filter parameter".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut messages = Messages::new(&mut conn);
    let deleted = messages.delete_where(&MessageFilter::from(&query)).await?;

    Ok(Json(BulkDeleteResponse { deleted }))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            BulkDeleteResponse,
            messages::{MessagePriority, MessageResponse, MessageStatus},
            users::Role,
        },
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_doctor_posts_message_with_default_priority(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let doctor = create_test_user(&pool, Role::Doctor).await;

        let response = server
            .post("/api/v1/messages")
            .add_header("authorization", bearer(&doctor, &config))
            .json(&json!({"content": "3号机械臂异响，请安排检修"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let message: MessageResponse = response.json();

        assert_eq!(message.sender_id, doctor.id);
        assert_eq!(message.sender_name, doctor.name);
        assert_eq!(message.status, MessageStatus::Unreviewed);
        assert_eq!(message.priority, MessagePriority::Normal);
        assert!(message.feedback.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_nurse_cannot_post_and_empty_content_is_refused(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let doctor = create_test_user(&pool, Role::Doctor).await;
        let nurse = create_test_user(&pool, Role::Nurse).await;

        let response = server
            .post("/api/v1/messages")
            .add_header("authorization", bearer(&nurse, &config))
            .json(&json!({"content": "回收站满了"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post("/api/v1/messages")
            .add_header("authorization", bearer(&doctor, &config))
            .json(&json!({"content": "  "}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_non_admins_only_see_their_own_messages(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let first = create_test_user(&pool, Role::Doctor).await;
        let second = create_test_user(&pool, Role::Doctor).await;

        for (doctor, content) in [(&first, "第一条"), (&second, "第二条")] {
            let response = server
                .post("/api/v1/messages")
                .add_header("authorization", bearer(doctor, &config))
                .json(&json!({"content": content}))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = server
            .get("/api/v1/messages")
            .add_header("authorization", bearer(&first, &config))
            .await;
        response.assert_status_ok();
        let mine: Vec<MessageResponse> = response.json();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].sender_id, first.id);

        let response = server
            .get("/api/v1/messages")
            .add_header("authorization", bearer(&admin, &config))
            .await;
        let all: Vec<MessageResponse> = response.json();
        assert_eq!(all.len(), 2);

        // Admins can narrow to one sender
        let response = server
            .get("/api/v1/messages")
            .add_query_param("sender_id", &second.id)
            .add_header("authorization", bearer(&admin, &config))
            .await;
        let filtered: Vec<MessageResponse> = response.json();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].sender_id, second.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_review_is_admin_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let doctor = create_test_user(&pool, Role::Doctor).await;

        let response = server
            .post("/api/v1/messages")
            .add_header("authorization", bearer(&doctor, &config))
            .json(&json!({"content": "3号机械臂异响"}))
            .await;
        let message: MessageResponse = response.json();

        let response = server
            .put(&format!("/api/v1/messages/{}", message.id))
            .add_header("authorization", bearer(&doctor, &config))
            .json(&json!({"status": "done"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .put(&format!("/api/v1/messages/{}", message.id))
            .add_header("authorization", bearer(&admin, &config))
            .json(&json!({"status": "done", "priority": "important", "feedback": "已联系厂家维修"}))
            .await;
        response.assert_status_ok();
        let reviewed: MessageResponse = response.json();
        assert_eq!(reviewed.status, MessageStatus::Done);
        assert_eq!(reviewed.priority, MessagePriority::Important);
        assert_eq!(reviewed.feedback.as_deref(), Some("已联系厂家维修"));

        // The sender sees the feedback on their own listing
        let response = server
            .get("/api/v1/messages")
            .add_header("authorization", bearer(&doctor, &config))
            .await;
        let mine: Vec<MessageResponse> = response.json();
        assert_eq!(mine[0].feedback.as_deref(), Some("已联系厂家维修"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_and_bulk_delete_are_admin_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let doctor = create_test_user(&pool, Role::Doctor).await;
        let auth = bearer(&admin, &config);

        for content in ["第一条", "第二条", "第三条"] {
            let response = server
                .post("/api/v1/messages")
                .add_header("authorization", bearer(&doctor, &config))
                .json(&json!({"content": content}))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = server
            .delete("/api/v1/messages")
            .add_query_param("sender_id", &doctor.id)
            .add_header("authorization", bearer(&doctor, &config))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server.delete("/api/v1/messages").add_header("authorization", &auth).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .delete("/api/v1/messages")
            .add_query_param("sender_id", &doctor.id)
            .add_header("authorization", &auth)
            .await;
        response.assert_status_ok();
        let result: BulkDeleteResponse = response.json();
        assert_eq!(result.deleted, 3);
    }
}
