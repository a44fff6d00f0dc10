//! Activity producers: the sources of watch-time ticks.
//!
//! A producer pushes `ActivitySignal`s into a channel until shutdown. The
//! accrual task (`tasks::accrual`) owns the other end and turns each signal
//! into exactly one increment. Which producer runs is a deployment choice
//! (`tracking.mode` in the config).

pub mod chat_producer;
pub mod presence_producer;
pub mod roster;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use crate::Error;

pub use chat_producer::ChatActivityProducer;
pub use presence_producer::PresenceActivityProducer;
pub use roster::{spawn_roster_task, ChannelRoster};

/// One qualifying unit of activity for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySignal {
    pub user_id: String,
    pub display_name: String,
}

impl ActivitySignal {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

#[async_trait]
pub trait ActivityProducer: Send {
    fn name(&self) -> &'static str;

    /// Emits signals into `sink` until `shutdown` flips to true or the sink
    /// closes. An `Err` return asks the caller to restart the producer.
    async fn run(
        &mut self,
        sink: mpsc::Sender<ActivitySignal>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), Error>;
}

/// Who is currently watching. Polled by the presence producer.
#[async_trait]
pub trait PresenceSource: Send + Sync {
    async fn current_chatters(&self) -> Result<Vec<ActivitySignal>, Error>;
}
