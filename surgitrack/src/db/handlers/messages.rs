//! Database repository for messages.

use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::{counters::Counters, repository::Repository},
    models::messages::{
        MessageCreateDBRequest, MessageDBResponse, MessageFilter, MessageUpdateDBRequest,
    },
};
use crate::types::{MessageId, RecordKind};

pub struct Messages<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Messages<'c> {
    type CreateRequest = MessageCreateDBRequest;
    type UpdateRequest = MessageUpdateDBRequest;
    type Response = MessageDBResponse;
    type Id = MessageId;
    type Filter = MessageFilter;

    #[instrument(skip(self, request), fields(sender = %request.sender_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let id = Counters::new(&mut tx).next_id(RecordKind::Message).await?;

        let message = sqlx::query_as::<_, MessageDBResponse>(
            r#"
            INSERT INTO messages (id, sender_id, sender_name, content, priority)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.sender_id)
        .bind(&request.sender_name)
        .bind(&request.content)
        .bind(request.priority)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(message)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let message = sqlx::query_as::<_, MessageDBResponse>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(message)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM messages WHERE 1=1");
        push_filter(&mut query, filter);

        query.push(" ORDER BY inserted_at DESC, id DESC");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        if let Some(skip) = filter.skip {
            query.push(" OFFSET ");
            query.push_bind(skip);
        }

        let messages = query.build_query_as::<MessageDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(messages)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Review: adjust status or priority, or leave feedback for the
    /// sender.
    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let message = sqlx::query_as::<_, MessageDBResponse>(
            r#"
            UPDATE messages SET
                status = COALESCE($2, status),
                priority = COALESCE($3, priority),
                feedback = COALESCE($4, feedback)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .bind(request.priority)
        .bind(&request.feedback)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(message)
    }
}

impl<'c> Messages<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Deletes every message matching the filter.
    #[instrument(skip(self, filter), err)]
    pub async fn delete_where(&mut self, filter: &MessageFilter) -> Result<u64> {
        let mut query = QueryBuilder::new("DELETE FROM messages WHERE 1=1");
        push_filter(&mut query, filter);

        let result = query.build().execute(&mut *self.db).await?;

        Ok(result.rows_affected())
    }
}

fn push_filter<'a>(query: &mut QueryBuilder<'a, sqlx::Postgres>, filter: &'a MessageFilter) {
    if let Some(ids) = &filter.ids {
        query.push(" AND id = ANY(");
        query.push_bind(ids);
        query.push(")");
    }
    if let Some(sender_ids) = &filter.sender_ids {
        query.push(" AND sender_id = ANY(");
        query.push_bind(sender_ids);
        query.push(")");
    }
    if let Some(sender_names) = &filter.sender_names {
        query.push(" AND sender_name = ANY(");
        query.push_bind(sender_names);
        query.push(")");
    }
    if let Some(statuses) = &filter.statuses {
        query.push(" AND status = ANY(");
        query.push_bind(statuses);
        query.push(")");
    }
    if let Some(priorities) = &filter.priorities {
        query.push(" AND priority = ANY(");
        query.push_bind(priorities);
        query.push(")");
    }
    if let Some(after) = filter.inserted_after {
        query.push(" AND inserted_at >= ");
        query.push_bind(after);
    }
    if let Some(before) = filter.inserted_before {
        query.push(" AND inserted_at < ");
        query.push_bind(before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::messages::{MessagePriority, MessageStatus};
    use sqlx::PgPool;

    fn request(content: &str) -> MessageCreateDBRequest {
        MessageCreateDBRequest {
            sender_id: "D-1001".to_string(),
            sender_name: "张伟".to_string(),
            content: content.to_string(),
            priority: MessagePriority::Normal,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_post_message_starts_unreviewed(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Messages::new(&mut conn);

        let message = repo.create(&request("3号机械臂异响")).await.unwrap();
        assert_eq!(message.id, 0);
        assert_eq!(message.status, MessageStatus::Unreviewed);
        assert_eq!(message.priority, MessagePriority::Normal);
        assert!(message.feedback.is_none());

        let next = repo.create(&request("请补充无菌壁套库存")).await.unwrap();
        assert_eq!(next.id, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_review_updates_status_and_feedback(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Messages::new(&mut conn);

        let message = repo.create(&request("3号机械臂异响")).await.unwrap();

        let review = MessageUpdateDBRequest {
            status: Some(MessageStatus::Done),
            priority: Some(MessagePriority::Important),
            feedback: Some("已联系厂家维修".to_string()),
        };
        let reviewed = repo.update(message.id, &review).await.unwrap();

        assert_eq!(reviewed.status, MessageStatus::Done);
        assert_eq!(reviewed.priority, MessagePriority::Important);
        assert_eq!(reviewed.feedback.as_deref(), Some("已联系厂家维修"));

        let result = repo.update(404, &MessageUpdateDBRequest::default()).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_status(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Messages::new(&mut conn);

        let first = repo.create(&request("第一条")).await.unwrap();
        repo.create(&request("第二条")).await.unwrap();

        let review = MessageUpdateDBRequest {
            status: Some(MessageStatus::Pending),
            ..Default::default()
        };
        repo.update(first.id, &review).await.unwrap();

        let pending = repo.list(&MessageFilter::new().status(MessageStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, first.id);

        let unreviewed = repo.list(&MessageFilter::new().status(MessageStatus::Unreviewed)).await.unwrap();
        assert_eq!(unreviewed.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_sender_name_and_time(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Messages::new(&mut conn);

        let first = repo.create(&request("第一条")).await.unwrap();
        repo.create(&MessageCreateDBRequest {
            sender_id: "N-2001".to_string(),
            sender_name: "李娜".to_string(),
            content: "器械台灯闪烁".to_string(),
            priority: MessagePriority::Normal,
        })
        .await
        .unwrap();

        let by_name = repo.list(&MessageFilter::new().sender_name("李娜")).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].sender_id, "N-2001");

        // The upper bound is exclusive: a cutoff at the first message's
        // own timestamp excludes everything posted at or after it.
        let earlier = repo.list(&MessageFilter::new().inserted_before(first.inserted_at)).await.unwrap();
        assert!(earlier.is_empty());

        let since = repo.list(&MessageFilter::new().inserted_after(first.inserted_at)).await.unwrap();
        assert_eq!(since.len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_where_clears_reviewed_messages(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Messages::new(&mut conn);

        let first = repo.create(&request("第一条")).await.unwrap();
        let second = repo.create(&request("第二条")).await.unwrap();

        let review = MessageUpdateDBRequest {
            status: Some(MessageStatus::Done),
            ..Default::default()
        };
        repo.update(first.id, &review).await.unwrap();

        let deleted = repo.delete_where(&MessageFilter::new().status(MessageStatus::Done)).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = repo.list(&MessageFilter::new()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);
    }
}
