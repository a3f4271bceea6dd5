//! Raw CSV shape of a feed response, before any schema is applied.
use csv::{ByteRecord, ReaderBuilder, Trim};

/// Tokens treated as missing values in addition to the empty cell.
const NULL_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    /// Every row is exactly `headers.len()` cells wide.
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Build a table from already-split cells. Short rows are padded with
    /// nulls and cells past the header width are dropped.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Parse CSV bytes. Invalid UTF-8 is replaced rather than rejected, so a
    /// stray Latin-1 name costs one character, not the whole response.
    pub fn parse(body: &[u8]) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(body);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();
        let width = headers.len();

        let mut rows = Vec::new();
        let mut record = ByteRecord::new();
        while reader.read_byte_record(&mut record)? {
            rows.push(record.iter().take(width).map(to_cell).collect());
        }

        Ok(Self::new(headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Index of the first column with this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of the named column, or `None` if the response lacks it.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = Option<&str>> + '_> {
        let idx = self.position(name)?;
        Some(self.rows.iter().map(move |row| row.get(idx).and_then(|c| c.as_deref())))
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

fn to_cell(value: &[u8]) -> Option<String> {
    let value = String::from_utf8_lossy(value);
    if value.is_empty() || NULL_MARKERS.contains(&&*value) {
        None
    } else {
        Some(value.into_owned())
    }
}
