// File: giveawaybot-core/src/test_utils/helpers.rs

use std::sync::Arc;
use crate::Error;
use crate::db::Database;
use crate::repositories::sqlite::{
    SqliteGiveawayRepository, SqliteStreamSessionRepository, SqliteUserRepository,
};

/// Returns a migrated, empty in-memory database.
pub async fn setup_test_database() -> Result<Database, Error> {
    let db = Database::new(":memory:").await?;
    db.migrate().await?;
    Ok(db)
}

/// The three SQLite repositories over one database.
pub struct TestRepos {
    pub db: Database,
    pub users: Arc<SqliteUserRepository>,
    pub giveaways: Arc<SqliteGiveawayRepository>,
    pub sessions: Arc<SqliteStreamSessionRepository>,
}

pub async fn setup_test_repos() -> Result<TestRepos, Error> {
    let db = setup_test_database().await?;
    Ok(TestRepos {
        users: Arc::new(SqliteUserRepository::new(db.pool().clone())),
        giveaways: Arc::new(SqliteGiveawayRepository::new(db.pool().clone())),
        sessions: Arc::new(SqliteStreamSessionRepository::new(db.pool().clone())),
        db,
    })
}
