use crate::state::messages::{LoadRequest, LoadResponse};
use datagolf_api::client::DataGolfApi;
use datagolf_api::{StatsQuery, StatsTable};
use log::{debug, error, warn};
use tokio::sync::mpsc;

/// Runs fetches on request and reports the outcome back to the main loop.
pub struct NetworkWorker {
    client: DataGolfApi,
    query: StatsQuery,
    requests: mpsc::Receiver<LoadRequest>,
    responses: mpsc::Sender<LoadResponse>,
}

impl NetworkWorker {
    pub fn new(
        client: DataGolfApi,
        query: StatsQuery,
        requests: mpsc::Receiver<LoadRequest>,
        responses: mpsc::Sender<LoadResponse>,
    ) -> Self {
        Self { client, query, requests, responses }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let response = match request {
                LoadRequest::FetchStats => self.handle_fetch_stats().await,
            };

            let fatal = matches!(response, LoadResponse::Failed { .. });
            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send load response: {e}");
                break;
            }
            if fatal {
                break;
            }
        }
    }

    async fn handle_fetch_stats(&self) -> LoadResponse {
        debug!(
            "fetching live stats (display={}, stats={})",
            self.query.display,
            self.query.stats_param()
        );
        match self.client.fetch_live_stats(&self.query).await {
            Ok(table) => {
                log_summary(&table);
                LoadResponse::StatsLoaded { table }
            }
            Err(error) => LoadResponse::Failed { error },
        }
    }
}

fn log_summary(table: &StatsTable) {
    if table.is_empty() {
        warn!("Live stats fetch returned no data");
        return;
    }
    match table.last_updated_at() {
        Some(at) => {
            let age = chrono::Utc::now().signed_duration_since(at);
            debug!("Loaded {} players, feed updated {} min ago", table.num_rows(), age.num_minutes());
        }
        None => debug!("Loaded {} players", table.num_rows()),
    }
}
