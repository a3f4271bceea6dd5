pub mod client;
pub mod raw;
pub mod secret;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::io;

pub use raw::RawTable;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
}

/// Every stat the live-tournament-stats feed knows about, in request order.
pub const ALL_STATS: [&str; 13] = [
    "sg_putt", "sg_arg", "sg_app", "sg_ott", "sg_t2g", "sg_bs", "sg_total", "distance",
    "accuracy", "gir", "prox_fw", "prox_rgh", "scrambling",
];

/// The columns a normalized table always exposes, in order.
pub const EXPECTED_COLUMNS: [(&str, ColumnKind); 24] = [
    ("event_name", ColumnKind::Text),
    ("last_updated", ColumnKind::Text),
    ("stat_display", ColumnKind::Text),
    ("position", ColumnKind::Text),
    ("player_name", ColumnKind::Text),
    ("dg_id", ColumnKind::Numeric),
    ("stat_round", ColumnKind::Numeric),
    ("course", ColumnKind::Text),
    ("total", ColumnKind::Numeric),
    ("round", ColumnKind::Numeric),
    ("thru", ColumnKind::Numeric),
    ("sg_putt", ColumnKind::Numeric),
    ("sg_arg", ColumnKind::Numeric),
    ("sg_app", ColumnKind::Numeric),
    ("sg_ott", ColumnKind::Numeric),
    ("sg_t2g", ColumnKind::Numeric),
    ("sg_bs", ColumnKind::Numeric),
    ("sg_total", ColumnKind::Numeric),
    ("distance", ColumnKind::Numeric),
    ("accuracy", ColumnKind::Numeric),
    ("gir", ColumnKind::Numeric),
    ("prox_fw", ColumnKind::Numeric),
    ("prox_rgh", ColumnKind::Numeric),
    ("scrambling", ColumnKind::Numeric),
];

/// Identifier columns that only appear on the first row of a block in the feed.
pub const FILL_COLUMNS: [&str; 3] = ["event_name", "last_updated", "stat_display"];

pub const DEFAULT_DISPLAY: &str = "value";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// What to ask the feed for. Values are passed through unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub display: String,
    pub stats: Vec<String>,
}

impl Default for StatsQuery {
    fn default() -> Self {
        Self {
            display: DEFAULT_DISPLAY.to_owned(),
            stats: ALL_STATS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl StatsQuery {
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    pub fn with_stats<I, S>(mut self, stats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stats = stats.into_iter().map(Into::into).collect();
        self
    }

    pub fn stats_param(&self) -> String {
        self.stats.join(",")
    }
}

// ---------------------------------------------------------------------------
// Normalized table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Text(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Numeric(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    pub fn cell(&self, row: usize) -> Option<Cell<'_>> {
        match self {
            ColumnValues::Text(v) => v.get(row)?.as_deref().map(Cell::Text),
            ColumnValues::Numeric(v) => (*v.get(row)?).map(Cell::Number),
        }
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            ColumnValues::Text(v) => Some(v),
            ColumnValues::Numeric(_) => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnValues::Numeric(v) => Some(v),
            ColumnValues::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        match self.values {
            ColumnValues::Text(_) => ColumnKind::Text,
            ColumnValues::Numeric(_) => ColumnKind::Numeric,
        }
    }
}

/// A single non-null cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

impl std::fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            // Integral values print without a trailing ".0" so ids stay ids.
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Column-oriented stats table. Either empty (no columns, no rows) or shaped
/// exactly like [`EXPECTED_COLUMNS`] once produced by [`client::normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTable {
    columns: Vec<Column>,
}

impl StatsTable {
    /// The degraded result of a failed fetch.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// True when the table has no columns at all.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<Cell<'_>> {
        self.column(name)?.values.cell(row)
    }

    /// Null counts for the named columns; unknown names are skipped.
    pub fn null_counts<'a>(&self, names: &[&'a str]) -> Vec<(&'a str, usize)> {
        names
            .iter()
            .filter_map(|name| self.column(name).map(|c| (*name, c.values.null_count())))
            .collect()
    }

    /// Parse the first non-null `last_updated` value.
    ///
    /// The feed stamps rows like `2024-04-14 22:01:22 UTC`; RFC 3339 is
    /// accepted as well.
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        let raw = self
            .column("last_updated")?
            .values
            .as_text()?
            .iter()
            .flatten()
            .next()?;
        parse_timestamp(raw)
    }

    /// Write the table as CSV with a header row. Nulls become empty cells.
    /// An empty table writes nothing.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        if self.is_empty() {
            return Ok(());
        }

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.columns.iter().map(|c| c.name.as_str()))?;
        for row in 0..self.num_rows() {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|c| c.values.cell(row).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Iterate rows as (column name, cell) pairs in schema order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<(&str, Option<Cell<'_>>)>> + '_ {
        (0..self.num_rows()).map(move |row| {
            self.columns
                .iter()
                .map(|c| (c.name.as_str(), c.values.cell(row)))
                .collect()
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = trimmed.strip_suffix("UTC").unwrap_or(trimmed).trim_end();
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}
