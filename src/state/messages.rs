use datagolf_api::StatsTable;
use datagolf_api::client::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    FetchStats,
}

#[derive(Debug)]
pub enum LoadResponse {
    StatsLoaded { table: StatsTable },
    /// Unrecoverable, e.g. the API key could not be resolved.
    Failed { error: ApiError },
}
