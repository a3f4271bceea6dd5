use crate::raw::RawTable;
use crate::secret::{API_KEY_SECRET, EnvSecretStore, SecretStore};
use crate::{
    Column, ColumnKind, ColumnValues, EXPECTED_COLUMNS, FILL_COLUMNS, StatsQuery, StatsTable,
};
use log::{debug, error, info};
use reqwest::{Client, Url};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DATAGOLF_FEEDS: &str = "https://feeds.datagolf.com";
const LIVE_STATS_PATH: &str = "preds/live-tournament-stats";
const FILE_FORMAT: &str = "csv";

/// DataGolf live tournament stats client.
#[derive(Clone)]
pub struct DataGolfApi {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
    secrets: Arc<dyn SecretStore>,
}

impl Default for DataGolfApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("dgstats/0.1 (live tournament stats loader)")
                .build()
                .unwrap_or_default(),
            base_url: DATAGOLF_FEEDS.to_owned(),
            timeout: None,
            secrets: Arc::new(EnvSecretStore),
        }
    }
}

impl fmt::Debug for DataGolfApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGolfApi")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ApiError {
    MissingSecret(String),
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(csv::Error),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingSecret(name) => write!(f, "Missing secret: {name}"),
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e) => write!(f, "Parse error: {e}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) | ApiError::Api(e, _) => Some(e),
            ApiError::Parsing(e) => Some(e),
            ApiError::MissingSecret(_) | ApiError::Other(_) => None,
        }
    }
}

impl DataGolfApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at another host, e.g. a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_secrets(mut self, secrets: impl SecretStore + 'static) -> Self {
        self.secrets = Arc::new(secrets);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch live tournament stats and normalize them to [`EXPECTED_COLUMNS`].
    ///
    /// Transport failures and error statuses are logged and yield
    /// [`StatsTable::empty`]. A missing API key or a body the CSV reader
    /// cannot split is returned as an error.
    pub async fn fetch_live_stats(&self, query: &StatsQuery) -> ApiResult<StatsTable> {
        let key = self.secrets.secret(API_KEY_SECRET)?;
        let url = self.live_stats_url(&key, query)?;

        let body = match self.get_bytes(url).await {
            Ok(body) => body,
            Err(e) => {
                error!("Error fetching live tournament stats: {e}");
                return Ok(StatsTable::empty());
            }
        };

        let raw = RawTable::parse(&body).map_err(ApiError::Parsing)?;
        Ok(normalize(raw))
    }

    fn live_stats_url(&self, key: &str, query: &StatsQuery) -> ApiResult<Url> {
        let endpoint = format!("{}/{LIVE_STATS_PATH}", self.base_url.trim_end_matches('/'));
        let stats = query.stats_param();
        Url::parse_with_params(
            &endpoint,
            &[
                ("key", key),
                ("file_format", FILE_FORMAT),
                ("display", query.display.as_str()),
                ("stats", stats.as_str()),
            ],
        )
        .map_err(|e| ApiError::Other(format!("invalid base url {}: {e}", self.base_url)))
    }

    async fn get_bytes(&self, url: Url) -> ApiResult<Vec<u8>> {
        let shown = redact_key(&url);
        let mut request = self.client.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        debug!("GET {shown}");
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.without_url(), shown.clone()))?;

        let response = response
            .error_for_status()
            .map_err(|e| ApiError::Api(e.without_url(), shown.clone()))?;

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ApiError::Network(e.without_url(), shown))
    }
}

/// Render a request URL with the `key` parameter masked.
fn redact_key(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "REDACTED".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

// ---------------------------------------------------------------------------
// Normalization: raw feed table → fixed schema
// ---------------------------------------------------------------------------

/// Conform a raw table to [`EXPECTED_COLUMNS`].
///
/// Missing columns come back all-null, extra columns are dropped, numeric
/// cells that don't parse become null, and the [`FILL_COLUMNS`] are
/// forward-filled.
pub fn normalize(raw: RawTable) -> StatsTable {
    info!("Columns in response: {:?}", raw.headers());

    let extras: Vec<&str> = raw
        .headers()
        .iter()
        .map(String::as_str)
        .filter(|h| !EXPECTED_COLUMNS.iter().any(|(name, _)| name == h))
        .collect();
    if !extras.is_empty() {
        debug!("Dropping unexpected columns: {extras:?}");
    }

    let rows = raw.num_rows();
    let mut columns: Vec<Column> = EXPECTED_COLUMNS
        .iter()
        .map(|&(name, kind)| {
            let values = match raw.column(name) {
                Some(cells) => cast(kind, cells),
                None => {
                    debug!("Column {name} missing from response, filling with nulls");
                    null_column(kind, rows)
                }
            };
            Column { name: name.to_owned(), values }
        })
        .collect();

    info!("Null values before fill: {:?}", identifier_nulls(&columns));
    for column in columns.iter_mut().filter(|c| FILL_COLUMNS.contains(&c.name.as_str())) {
        match &mut column.values {
            ColumnValues::Text(values) => forward_fill(values),
            ColumnValues::Numeric(values) => forward_fill(values),
        }
    }
    info!("Null values after fill: {:?}", identifier_nulls(&columns));

    StatsTable::from_columns(columns)
}

fn cast<'a>(kind: ColumnKind, cells: impl Iterator<Item = Option<&'a str>>) -> ColumnValues {
    match kind {
        ColumnKind::Text => ColumnValues::Text(cells.map(|c| c.map(str::to_owned)).collect()),
        ColumnKind::Numeric => ColumnValues::Numeric(cells.map(|c| c.and_then(parse_number)).collect()),
    }
}

fn null_column(kind: ColumnKind, rows: usize) -> ColumnValues {
    match kind {
        ColumnKind::Text => ColumnValues::Text(vec![None; rows]),
        ColumnKind::Numeric => ColumnValues::Numeric(vec![None; rows]),
    }
}

/// Lenient numeric parse; text and NaN come back as null.
fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Replace each null with the closest preceding non-null value.
fn forward_fill<T: Clone>(values: &mut [Option<T>]) {
    let mut last: Option<T> = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(v.clone()),
            None => *value = last.clone(),
        }
    }
}

fn identifier_nulls(columns: &[Column]) -> Vec<(&str, usize)> {
    columns
        .iter()
        .filter(|c| FILL_COLUMNS.contains(&c.name.as_str()))
        .map(|c| (c.name.as_str(), c.values.null_count()))
        .collect()
}
