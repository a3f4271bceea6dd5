mod args;
mod output;
mod state;

use crate::args::Args;
use crate::output::TableSink;
use crate::state::app_settings::AppSettings;
use crate::state::messages::{LoadRequest, LoadResponse};
use crate::state::network::NetworkWorker;
use crate::state::refresher::PeriodicRefresher;
use clap::Parser;
use datagolf_api::client::DataGolfApi;
use log::info;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    better_panic::install();

    let settings = AppSettings::load().with_base_url_override(args.base_url.clone());
    env_logger::Builder::new()
        .filter_level(settings.log_level)
        .parse_default_env()
        .init();

    let mut client = DataGolfApi::new().with_base_url(settings.base_url.as_str());
    if let Some(timeout) = args.request_timeout() {
        client = client.with_timeout(timeout);
    }
    info!("Loading live tournament stats from {}", client.base_url());
    let sink = TableSink::new(args.format, args.output.clone()).keep_last_good(args.watch.is_some());

    let (load_req_tx, load_req_rx) = mpsc::channel::<LoadRequest>(16);
    let (load_resp_tx, load_resp_rx) = mpsc::channel::<LoadResponse>(16);

    let network_worker = NetworkWorker::new(client, args.query(), load_req_rx, load_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    let periodic_task = args.watch_interval().map(|period| {
        info!("Refreshing live stats every {}s", period.as_secs());
        tokio::spawn(PeriodicRefresher::new(load_req_tx.clone(), period).run())
    });

    // Initial load
    load_req_tx.send(LoadRequest::FetchStats).await?;

    let result = main_loop(load_resp_rx, &sink, periodic_task.is_some()).await;

    network_task.abort();
    if let Some(task) = periodic_task {
        task.abort();
    }

    result
}

/// Write every loaded table. Stops after the first one unless watching, and
/// on Ctrl-C or a fatal load error.
async fn main_loop(
    mut load_responses: mpsc::Receiver<LoadResponse>,
    sink: &TableSink,
    watching: bool,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            response = load_responses.recv() => {
                let Some(response) = response else {
                    return Ok(());
                };
                match response {
                    LoadResponse::StatsLoaded { table } => {
                        if sink.write(&table)?
                            && let Some(path) = sink.path()
                        {
                            info!("Wrote {} rows to {}", table.num_rows(), path.display());
                        }
                        if !watching {
                            return Ok(());
                        }
                    }
                    LoadResponse::Failed { error } => return Err(error.into()),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::OutputFormat;
    use datagolf_api::client::ApiError;

    #[tokio::test]
    async fn failed_load_is_returned_as_the_error() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(LoadResponse::Failed {
            error: ApiError::MissingSecret("DATAGOLF_API_KEY".to_owned()),
        })
        .await
        .unwrap();

        let sink = TableSink::new(OutputFormat::Csv, None);
        let err = main_loop(rx, &sink, true).await.unwrap_err();
        assert!(err.to_string().contains("DATAGOLF_API_KEY"));
    }

    #[tokio::test]
    async fn closed_channel_ends_the_loop() {
        let (tx, rx) = mpsc::channel::<LoadResponse>(1);
        drop(tx);

        let sink = TableSink::new(OutputFormat::Csv, None);
        assert!(main_loop(rx, &sink, true).await.is_ok());
    }
}
