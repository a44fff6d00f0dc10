use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use crate::Error;
use super::{ActivityProducer, ActivitySignal, PresenceSource};

/// One signal per present chatter per poll interval.
pub struct PresenceActivityProducer<P: PresenceSource> {
    source: Arc<P>,
    interval: Duration,
}

impl<P: PresenceSource> PresenceActivityProducer<P> {
    pub fn new(source: Arc<P>, interval: Duration) -> Self {
        Self { source, interval }
    }
}

#[async_trait]
impl<P: PresenceSource + 'static> ActivityProducer for PresenceActivityProducer<P> {
    fn name(&self) -> &'static str {
        "presence"
    }

    async fn run(
        &mut self,
        sink: mpsc::Sender<ActivitySignal>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), Error> {
        info!("Presence activity producer started; polling every {:?}", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.source.current_chatters().await {
                        Ok(chatters) => {
                            debug!("presence poll: {} chatter(s)", chatters.len());
                            for signal in chatters {
                                if sink.send(signal).await.is_err() {
                                    info!("Presence activity producer: sink closed.");
                                    return Ok(());
                                }
                            }
                        }
                        Err(e) => {
                            // Try again on the next tick.
                            error!("Presence poll failed: {:?}", e);
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Presence activity producer shutting down.");
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
