//! Database operations for messaging
//!
//! PostgreSQL implementations of the message store, user directory and post
//! snapshot seams. Tables are created by the migrations under `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::backend::error::types::{BackendError, BackendResult};
use crate::backend::messaging::directory::{PostSnapshots, UserDirectory};
use crate::backend::messaging::store::MessageStore;
use crate::shared::messaging::{Conversation, DirectMessage, MessageKind, NewMessage, PostSnapshot, UserSummary};

const MESSAGE_COLUMNS: &str =
    "id, sender_id, recipient_id, content, kind, post_id, read, created_at, client_id";

fn message_from_row(row: &PgRow) -> DirectMessage {
    DirectMessage {
        id: row.get::<Uuid, _>("id").to_string(),
        sender: row.get("sender_id"),
        recipient: row.get("recipient_id"),
        content: row.get("content"),
        kind: MessageKind::from_db(row.get::<String, _>("kind").as_str()),
        post_id: row.get("post_id"),
        post: None,
        read: row.get("read"),
        created_at: row.get("created_at"),
        client_id: row.get("client_id"),
    }
}

/// Message store backed by the `direct_messages` table
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, intent: NewMessage) -> BackendResult<DirectMessage> {
        intent.validate()?;

        let recipient_exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(&intent.recipient)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !recipient_exists {
            return Err(BackendError::not_found("recipient", intent.recipient));
        }

        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO direct_messages (id, sender_id, recipient_id, content, kind, post_id, read, client_id)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&intent.sender)
        .bind(&intent.recipient)
        .bind(&intent.content)
        .bind(intent.kind.as_str())
        .bind(&intent.post_id)
        .bind(&intent.client_id)
        .fetch_one(&self.pool)
        .await?;

        let message = message_from_row(&row);
        tracing::debug!("[Store] Persisted {} from {} to {}", message.id, message.sender, message.recipient);
        Ok(message)
    }

    async fn history(&self, a: &str, b: &str) -> BackendResult<Vec<DirectMessage>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM direct_messages
            WHERE (sender_id = $1 AND recipient_id = $2) OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at ASC, seq ASC
            "#
        ))
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    async fn history_since(&self, a: &str, b: &str, since: DateTime<Utc>) -> BackendResult<Vec<DirectMessage>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM direct_messages
            WHERE ((sender_id = $1 AND recipient_id = $2) OR (sender_id = $2 AND recipient_id = $1))
              AND created_at >= $3
            ORDER BY created_at ASC, seq ASC
            "#
        ))
        .bind(a)
        .bind(b)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    async fn conversations_for(&self, user: &str) -> BackendResult<Vec<Conversation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT latest.*, u.name AS counterpart_name, u.avatar AS counterpart_avatar
            FROM (
                SELECT DISTINCT ON (CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END)
                    {MESSAGE_COLUMNS}, seq,
                    CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END AS counterpart
                FROM direct_messages
                WHERE sender_id = $1 OR recipient_id = $1
                ORDER BY CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END,
                         created_at DESC, seq DESC
            ) latest
            LEFT JOIN users u ON u.id = latest.counterpart
            ORDER BY latest.created_at DESC, latest.seq DESC
            "#
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let mut conversation = Conversation::from_latest(user, message_from_row(row));
                if let Some(name) = row.get::<Option<String>, _>("counterpart_name") {
                    conversation.user.name = name;
                }
                conversation.user.avatar = row.get("counterpart_avatar");
                conversation
            })
            .collect())
    }

    async fn mark_read(&self, user: &str, counterpart: &str) -> BackendResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE direct_messages
            SET read = TRUE
            WHERE recipient_id = $1 AND sender_id = $2 AND read = FALSE
            "#,
        )
        .bind(user)
        .bind(counterpart)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// User directory backed by the `users` table
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn resolve_user(&self, id: &str) -> BackendResult<Option<UserSummary>> {
        let row = sqlx::query("SELECT id, name, avatar FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| UserSummary {
            id: r.get("id"),
            name: r.get("name"),
            avatar: r.get("avatar"),
        }))
    }
}

/// Post snapshot service backed by the `posts` table
#[derive(Clone)]
pub struct PgPostSnapshots {
    pool: PgPool,
}

impl PgPostSnapshots {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostSnapshots for PgPostSnapshots {
    async fn resolve_post(&self, id: &str) -> BackendResult<Option<PostSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.content, p.image, u.id AS author_id, u.name AS author_name, u.avatar AS author_avatar
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| PostSnapshot {
            id: r.get("id"),
            author: UserSummary {
                id: r.get("author_id"),
                name: r.get("author_name"),
                avatar: r.get("author_avatar"),
            },
            content: r.get("content"),
            image: r.get("image"),
        }))
    }
}
