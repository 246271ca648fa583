use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::data::model::Corpus;
use crate::error::{Error, Result};
use crate::expr::{FormatSpec, Value};

// ---------------------------------------------------------------------------
// Table – one row of derived values per record
// ---------------------------------------------------------------------------

/// Rows of evaluated expressions, in corpus order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    sources: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Evaluate `format` for every record. The first failing record aborts the
    /// build; the error names its source file.
    pub fn build(corpus: &Corpus, format: &FormatSpec) -> Result<Self> {
        let mut rows = Vec::with_capacity(corpus.len());
        let mut sources = Vec::with_capacity(corpus.len());
        for entry in corpus.iter() {
            let row = format
                .evaluate(&entry.record)
                .map_err(|e| e.in_source(entry.source.clone()))?;
            log::debug!("{}: {} values", entry.source, row.len());
            rows.push(row);
            sources.push(entry.source.clone());
        }
        log::info!(
            "built table with {} rows x {} columns",
            rows.len(),
            format.len()
        );
        Ok(Table {
            columns: format.columns(),
            sources,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// File each row came from.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column whose expression text is `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of `column`, checked against the number of columns.
    pub fn resolve_column(&self, column: &ColumnRef) -> Result<usize> {
        let index = match column {
            ColumnRef::Index(index) => *index,
            ColumnRef::Name(name) => match self.column_index(name) {
                Some(index) => index,
                None => {
                    return Err(Error::UnknownColumn {
                        name: name.clone(),
                        columns: self.columns.clone(),
                    })
                }
            },
        };
        self.check_column(index)?;
        Ok(index)
    }

    fn check_column(&self, index: usize) -> Result<()> {
        if index >= self.columns.len() {
            return Err(Error::Index {
                what: "column",
                index,
                len: self.columns.len(),
            });
        }
        Ok(())
    }

    /// `[x, y]` points taken from columns `x` and `y` of every row.
    pub fn column_pair(&self, x: usize, y: usize) -> Result<Vec<[f64; 2]>> {
        self.check_column(x)?;
        self.check_column(y)?;
        self.rows
            .iter()
            .zip(&self.sources)
            .map(|(row, source)| -> Result<[f64; 2]> {
                let cell = |i: usize| {
                    row[i].as_f64().ok_or_else(|| {
                        Error::type_mismatch(format!(
                            "column '{}' is {}, not a number",
                            self.columns[i],
                            row[i].kind()
                        ))
                        .in_source(source.clone())
                    })
                };
                Ok([cell(x)?, cell(y)?])
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// Write the table to `out` in the requested format.
    pub fn write<W: Write>(&self, out: W, format: OutputFormat, header: bool) -> Result<()> {
        match format {
            OutputFormat::Text => self.write_text(out, header),
            OutputFormat::Csv => self.write_delimited(out, b',', header),
            OutputFormat::Tsv => self.write_delimited(out, b'\t', header),
            OutputFormat::Json => self.write_json(out),
        }
        .map_err(|source| Error::Io {
            path: "<output>".into(),
            source,
        })
    }

    /// Space separated, one line per record.
    fn write_text<W: Write>(&self, mut out: W, header: bool) -> std::io::Result<()> {
        if header {
            writeln!(out, "# {}", self.columns.join(" "))?;
        }
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(out, "{}", line.join(" "))?;
        }
        out.flush()
    }

    fn write_delimited<W: Write>(
        &self,
        out: W,
        delimiter: u8,
        header: bool,
    ) -> std::io::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(out);
        if header {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()
    }

    /// An array with one object per record, keyed by column.
    fn write_json<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        let keys = json_keys(&self.columns);
        let records: Vec<JsonValue> = self
            .rows
            .iter()
            .zip(&self.sources)
            .map(|(row, source)| {
                let mut obj = Map::new();
                obj.insert("source".into(), JsonValue::String(source.clone()));
                for (key, value) in keys.iter().zip(row) {
                    obj.insert(key.clone(), to_json(value));
                }
                JsonValue::Object(obj)
            })
            .collect();
        serde_json::to_writer_pretty(&mut out, &records)?;
        writeln!(out)?;
        out.flush()
    }
}

/// Object keys for `columns`. A repeated column gets a `#2`, `#3`, ... suffix.
fn json_keys(columns: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    columns
        .iter()
        .map(|col| {
            let n = seen.entry(col.as_str()).or_insert(0);
            *n += 1;
            if *n == 1 {
                col.clone()
            } else {
                format!("{col}#{n}")
            }
        })
        .collect()
}

fn to_json(value: &impl Serialize) -> JsonValue {
    // serde_json maps NaN and infinities to null
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

/// A table column given either by position or by its expression text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl From<&str> for ColumnRef {
    /// Digits select by position; anything else is matched against the
    /// expression text.
    fn from(text: &str) -> Self {
        match text.parse() {
            Ok(index) => ColumnRef::Index(index),
            Err(_) => ColumnRef::Name(text.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Output format selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Space separated values, one record per line
    #[default]
    Text,
    Csv,
    Tsv,
    Json,
}
