// src/repositories/sqlite/giveaway.rs

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use giveawaybot_common::models::GiveawayEntrant;
use giveawaybot_common::traits::repository_traits::GiveawayRepository;
use crate::utils::time::{current_epoch, from_epoch};
use crate::Error;

#[derive(Clone)]
pub struct SqliteGiveawayRepository {
    pool: Pool<Sqlite>,
}

impl SqliteGiveawayRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GiveawayRepository for SqliteGiveawayRepository {
    async fn try_add_entrant(&self, key_name: &str, user_id: &str, username: &str) -> Result<bool, Error> {
        // The UNIQUE(key_name, user_id) constraint decides; no read-then-insert.
        let result = sqlx::query(
            r#"
            INSERT INTO giveaway_participants (key_name, user_id, username, joined_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key_name, user_id) DO NOTHING
            "#
        )
            .bind(key_name)
            .bind(user_id)
            .bind(username)
            .bind(current_epoch())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_entrants(&self, key_name: &str) -> Result<Vec<GiveawayEntrant>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, key_name, user_id, username, joined_at
            FROM giveaway_participants
            WHERE key_name = ?
            ORDER BY id ASC
            "#
        )
            .bind(key_name)
            .fetch_all(&self.pool)
            .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(GiveawayEntrant {
                key_name: row.try_get("key_name")?,
                user_id: row.try_get("user_id")?,
                username: row.try_get("username")?,
                join_order: row.try_get("id")?,
                joined_at: from_epoch(row.try_get::<i64, _>("joined_at")?),
            });
        }
        Ok(results)
    }

    async fn count_entrants(&self, key_name: &str) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM giveaway_participants WHERE key_name = ?"
        )
            .bind(key_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn clear_entrants(&self, key_name: &str) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM giveaway_participants WHERE key_name = ?")
            .bind(key_name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
