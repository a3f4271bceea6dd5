use crate::state::messages::LoadRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Asks for a fresh stats load on a fixed period. The initial load is sent
/// by the caller, so the first tick is skipped.
pub struct PeriodicRefresher {
    load_requests: mpsc::Sender<LoadRequest>,
    period: Duration,
}

impl PeriodicRefresher {
    pub fn new(load_requests: mpsc::Sender<LoadRequest>, period: Duration) -> Self {
        Self { load_requests, period }
    }

    pub async fn run(self) {
        let mut stats_interval = interval(self.period);
        stats_interval.tick().await;

        loop {
            stats_interval.tick().await;
            if self.load_requests.send(LoadRequest::FetchStats).await.is_err() {
                break;
            }
        }
    }
}
