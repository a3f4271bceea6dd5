use crate::args::OutputFormat;
use anyhow::{Context, Result};
use datagolf_api::{Cell, StatsTable};
use log::warn;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where each loaded table goes.
#[derive(Debug, Clone)]
pub struct TableSink {
    format: OutputFormat,
    path: Option<PathBuf>,
    keep_last_good: bool,
}

impl TableSink {
    pub fn new(format: OutputFormat, path: Option<PathBuf>) -> Self {
        Self { format, path, keep_last_good: false }
    }

    /// Leave an existing output file alone when a load comes back empty.
    pub fn keep_last_good(mut self, keep: bool) -> Self {
        self.keep_last_good = keep;
        self
    }

    /// Write the table to stdout, or replace the target file. Files are
    /// written beside the target and renamed over it, so readers never see
    /// a partial table. Returns `false` if the write was skipped.
    pub fn write(&self, table: &StatsTable) -> Result<bool> {
        match &self.path {
            Some(path) if table.is_empty() && self.keep_last_good => {
                warn!("Empty load, keeping previous contents of {}", path.display());
                return Ok(false);
            }
            Some(path) => {
                let staging = staging_path(path);
                let file = File::create(&staging)
                    .with_context(|| format!("could not create {}", staging.display()))?;
                let mut out = BufWriter::new(file);
                write_table(table, self.format, &mut out)?;
                out.flush().with_context(|| format!("could not write {}", staging.display()))?;
                drop(out);
                fs::rename(&staging, path)
                    .with_context(|| format!("could not replace {}", path.display()))?;
            }
            None => {
                let mut out = io::stdout().lock();
                write_table(table, self.format, &mut out)?;
                out.flush()?;
            }
        }
        Ok(true)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Hidden sibling of `path` used while a new table is being written.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dgstats".to_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

pub fn write_table<W: Write>(table: &StatsTable, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Csv => table.write_csv(out).context("could not write CSV")?,
        OutputFormat::Json => {
            let rows: Vec<JsonRow<'_>> = table.rows().map(JsonRow).collect();
            serde_json::to_writer(&mut *out, &rows).context("could not write JSON")?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// One table row as a JSON object keyed by column name, in schema order.
struct JsonRow<'a>(Vec<(&'a str, Option<Cell<'a>>)>);

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, cell) in &self.0 {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}
