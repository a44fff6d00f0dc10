use std::sync::Arc;
use tracing::info;
use giveawaybot_common::models::StreamSession;
use giveawaybot_common::traits::repository_traits::StreamSessionRepository;
use crate::Error;

/// Owns the broadcast epoch. Starting a new stream zeroes all watch time.
pub struct StreamSessionService {
    session_repo: Arc<dyn StreamSessionRepository>,
}

impl StreamSessionService {
    pub fn new(session_repo: Arc<dyn StreamSessionRepository>) -> Self {
        Self { session_repo }
    }

    /// Rotates the active session and resets every user's watch time in one
    /// transaction. Irreversible. Callers enforce the moderator/broadcaster check.
    pub async fn start_new_stream(&self) -> Result<StreamSession, Error> {
        let session = self.session_repo.start_new_session().await?;
        info!("New stream session #{} started; watch time reset.", session.session_id);
        Ok(session)
    }

    pub async fn active_session(&self) -> Result<Option<StreamSession>, Error> {
        self.session_repo.get_active_session().await
    }
}
