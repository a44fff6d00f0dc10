// src/repositories/sqlite/stream_session.rs

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use giveawaybot_common::models::StreamSession;
use giveawaybot_common::traits::repository_traits::StreamSessionRepository;
use crate::repositories::sqlite::user::RESET_ALL_WATCH_TIME_SQL;
use crate::utils::time::{current_epoch, from_epoch};
use crate::Error;

#[derive(Clone)]
pub struct SqliteStreamSessionRepository {
    pool: Pool<Sqlite>,
}

impl SqliteStreamSessionRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreamSessionRepository for SqliteStreamSessionRepository {
    async fn start_new_session(&self) -> Result<StreamSession, Error> {
        let started_at = current_epoch();
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE stream_sessions SET is_active = 0 WHERE is_active = 1")
            .execute(&mut *tx)
            .await?;

        let session_id: i64 = sqlx::query_scalar(
            "INSERT INTO stream_sessions (started_at, is_active) VALUES (?, 1) RETURNING id"
        )
            .bind(started_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(RESET_ALL_WATCH_TIME_SQL)
            .execute(&mut *tx)
            .await?;

        // Dropping `tx` on any early return above rolls everything back.
        tx.commit().await?;

        Ok(StreamSession {
            session_id,
            started_at: from_epoch(started_at),
            is_active: true,
        })
    }

    async fn get_active_session(&self) -> Result<Option<StreamSession>, Error> {
        let row = sqlx::query(
            r#"
            SELECT id, started_at, is_active
            FROM stream_sessions
            WHERE is_active = 1
            ORDER BY id DESC
            LIMIT 1
            "#
        )
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row {
            Ok(Some(StreamSession {
                session_id: r.try_get("id")?,
                started_at: from_epoch(r.try_get::<i64, _>("started_at")?),
                is_active: r.try_get("is_active")?,
            }))
        } else {
            Ok(None)
        }
    }
}
