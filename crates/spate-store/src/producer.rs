//! Production loop — grows the store on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::dice::Dice;
use crate::params::ProductionParameters;
use crate::store::WorkloadStore;

/// Default production period.
pub const DEFAULT_PRODUCE_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically adds `amount + uniform(0..=variation)` units to the store.
pub struct Producer {
    store: Arc<WorkloadStore>,
    params: Arc<ProductionParameters>,
    dice: Arc<dyn Dice>,
    interval: Duration,
}

impl Producer {
    pub fn new(
        store: Arc<WorkloadStore>,
        params: Arc<ProductionParameters>,
        dice: Arc<dyn Dice>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            params,
            dice,
            interval,
        }
    }

    /// Run a single production step and return the units added.
    pub fn tick(&self) -> u64 {
        let settings = self.params.get();
        let delta = settings.draw_delta(self.dice.as_ref());
        let level = self.store.produce(delta);
        debug!(
            delta,
            store = level,
            amount = settings.amount,
            variation = settings.variation,
            "production tick"
        );
        delta
    }

    /// Produce every interval until shutdown. The first tick is immediate.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "producer started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                _ = shutdown.changed() => {
                    info!("producer shutting down");
                    break;
                }
            }
        }
    }
}
