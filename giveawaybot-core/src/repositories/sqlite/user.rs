// src/repositories/sqlite/user.rs

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use giveawaybot_common::models::User;
use giveawaybot_common::traits::repository_traits::UserRepository;
use crate::utils::time::{current_epoch, from_epoch};
use crate::Error;

pub(crate) const RESET_ALL_WATCH_TIME_SQL: &str = "UPDATE users SET stream_watch_time = 0";

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: Pool<Sqlite>,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn increment_watch_time(&self, user_id: &str, username: &str) -> Result<i64, Error> {
        // Upsert + RETURNING keeps create-or-increment in a single statement.
        let total: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (user_id, username, stream_watch_time, last_seen)
            VALUES (?, ?, 1, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                stream_watch_time = users.stream_watch_time + 1,
                username = excluded.username,
                last_seen = excluded.last_seen
            RETURNING stream_watch_time
            "#
        )
            .bind(user_id)
            .bind(username)
            .bind(current_epoch())
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn get_watch_time(&self, user_id: &str) -> Result<i64, Error> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT stream_watch_time FROM users WHERE user_id = ?"
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(total.unwrap_or(0))
    }

    async fn reset_all_watch_time(&self) -> Result<(), Error> {
        sqlx::query(RESET_ALL_WATCH_TIME_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query(
            r#"
            SELECT user_id, username, stream_watch_time, last_seen
            FROM users
            WHERE user_id = ?
            "#
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row {
            Ok(Some(User {
                user_id: r.try_get("user_id")?,
                username: r.try_get("username")?,
                stream_watch_time: r.try_get("stream_watch_time")?,
                last_seen: from_epoch(r.try_get::<i64, _>("last_seen")?),
            }))
        } else {
            Ok(None)
        }
    }
}
