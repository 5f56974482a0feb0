use std::sync::Arc;

use tokio::time::{ interval, Duration, MissedTickBehavior };
use tracing::{ error, info };

use crate::services::ContractService;

/// Keeps cached presale status and sale progress in step with the chain.
pub struct PresaleRefresher {
    contracts: Arc<ContractService>,
    period: Duration,
}

impl PresaleRefresher {
    pub fn new(contracts: Arc<ContractService>, period: Duration) -> Self {
        Self { contracts, period }
    }

    pub async fn start(self) {
        info!(period_secs = self.period.as_secs(), "Presale refresher started");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    async fn tick(&self) {
        match self.contracts.refresh_open_presales().await {
            Ok(summary) if summary.refreshed + summary.failed > 0 => {
                info!(refreshed = summary.refreshed, failed = summary.failed, "Presales refreshed");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "Presale refresh pass failed"),
        }
    }
}
