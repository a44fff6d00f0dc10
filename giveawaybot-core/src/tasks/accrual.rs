// giveawaybot-core/src/tasks/accrual.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::services::activity::{ActivityProducer, ActivitySignal};
use crate::services::watch_time_service::WatchTimeService;

const SIGNAL_BUFFER: usize = 1024;
pub const PRODUCER_RESTART_DELAY: Duration = Duration::from_secs(5);

/// Spawns the accrual engine: `producer` feeds signals, and every signal is
/// credited as one tick through `watch_time`.
///
/// A failed increment is logged and the tick dropped; the loop keeps going.
/// A producer that returns an error is restarted after a short delay. The
/// task ends once `shutdown_rx` flips to true and queued signals are drained.
pub fn spawn_accrual_task(
    producer: Box<dyn ActivityProducer>,
    watch_time: Arc<WatchTimeService>,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    spawn_accrual_task_with_restart_delay(producer, watch_time, shutdown_rx, PRODUCER_RESTART_DELAY)
}

/// Same as [`spawn_accrual_task`], waiting `restart_delay` before restarting
/// a failed producer.
pub fn spawn_accrual_task_with_restart_delay(
    mut producer: Box<dyn ActivityProducer>,
    watch_time: Arc<WatchTimeService>,
    shutdown_rx: watch::Receiver<bool>,
    restart_delay: Duration,
) -> JoinHandle<()> {
    let (tx, mut rx) = mpsc::channel::<ActivitySignal>(SIGNAL_BUFFER);
    let producer_name = producer.name();

    let producer_shutdown = shutdown_rx.clone();
    let producer_handle = tokio::spawn(async move {
        loop {
            match producer.run(tx.clone(), producer_shutdown.clone()).await {
                Ok(()) => break,
                Err(e) => {
                    if *producer_shutdown.borrow() {
                        break;
                    }
                    error!("Activity producer '{}' failed: {:?}; restarting in {:?}",
                        producer_name, e, restart_delay);
                    sleep(restart_delay).await;
                }
            }
        }
        // Dropping `tx` here lets the consumer drain and finish.
    });

    tokio::spawn(async move {
        info!("Accrual task started with '{}' producer", producer_name);
        let mut credited: u64 = 0;
        let mut dropped: u64 = 0;

        while let Some(signal) = rx.recv().await {
            match watch_time.record_activity(&signal).await {
                Ok(total) => {
                    credited += 1;
                    debug!("tick credited: user_id={} total={}", signal.user_id, total);
                }
                Err(e) => {
                    dropped += 1;
                    error!("Failed to credit watch time for user_id={} ({}): {:?}",
                        signal.user_id, signal.display_name, e);
                }
            }
        }

        if let Err(e) = producer_handle.await {
            warn!("Activity producer task ended abnormally: {:?}", e);
        }
        info!("Accrual task exited. credited={} dropped={}", credited, dropped);
    })
}
