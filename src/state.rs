use std::collections::BTreeSet;
use std::path::PathBuf;

use eframe::egui::Color32;

use probe_drum::data::loader;
use probe_drum::data::model::Corpus;
use probe_drum::expr::FormatSpec;
use probe_drum::table::Table;

use crate::color::record_colors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// What the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Two table columns against each other, one point per record.
    Table,
    /// The selected spectrum of every visible record.
    Spectra,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub corpus: Corpus,

    /// Column expressions evaluated for every record.
    pub format: FormatSpec,

    /// Spectrum to select in files opened from the UI.
    pub spectrum_index: Option<usize>,

    /// Evaluated table (None if the last evaluation failed).
    pub table: Option<Table>,

    /// x and y column indices for the table view.
    pub x_column: usize,
    pub y_column: usize,

    pub view: View,

    /// Records drawn in the spectra view.
    pub visible: BTreeSet<usize>,

    /// One colour per record, in corpus order.
    pub colors: Vec<Color32>,

    pub minmax_scaling: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(
        corpus: Corpus,
        format: FormatSpec,
        spectrum_index: Option<usize>,
        [x_column, y_column]: [usize; 2],
    ) -> Self {
        let mut state = Self {
            corpus,
            format,
            spectrum_index,
            table: None,
            x_column,
            y_column,
            view: View::Table,
            visible: BTreeSet::new(),
            colors: Vec::new(),
            minmax_scaling: false,
            status_message: None,
        };
        state.rebuild();
        state.select_all();
        state
    }

    /// Re-evaluate the table and colours after the corpus changed.
    pub fn rebuild(&mut self) {
        self.colors = record_colors(self.corpus.len());
        match Table::build(&self.corpus, &self.format) {
            Ok(table) => {
                self.table = Some(table);
                self.status_message = None;
            }
            Err(e) => {
                let msg = error_chain(e);
                log::error!("Failed to evaluate table: {msg}");
                self.status_message = Some(format!("Error: {msg}"));
                self.table = None;
            }
        }
    }

    /// Append files to the corpus. A file that fails to load is reported and
    /// nothing from that batch is added.
    pub fn add_files(&mut self, paths: &[PathBuf]) {
        let loaded = match self.spectrum_index {
            Some(i) => loader::load_corpus_with_spectrum(paths, i),
            None => loader::load_corpus(paths),
        };
        match loaded {
            Ok(extra) => {
                let first = self.corpus.len();
                for entry in extra.entries() {
                    self.corpus.push(entry.source.clone(), entry.record.clone());
                }
                log::info!("Added {} records", extra.len());
                self.visible.extend(first..self.corpus.len());
                self.rebuild();
            }
            Err(e) => {
                let msg = error_chain(e);
                log::error!("Failed to load files: {msg}");
                self.status_message = Some(format!("Error: {msg}"));
            }
        }
    }

    /// Points for the table view, or the reason there are none.
    pub fn table_points(&self) -> Result<Vec<[f64; 2]>, String> {
        let table = self.table.as_ref().ok_or("table could not be evaluated")?;
        table
            .column_pair(self.x_column, self.y_column)
            .map_err(error_chain)
    }

    /// Column name for axis labels.
    pub fn column_name(&self, index: usize) -> String {
        self.table
            .as_ref()
            .and_then(|t| t.columns().get(index).cloned())
            .unwrap_or_else(|| format!("column {index}"))
    }

    pub fn toggle_visible(&mut self, index: usize) {
        if !self.visible.remove(&index) {
            self.visible.insert(index);
        }
    }

    pub fn select_all(&mut self) {
        self.visible = (0..self.corpus.len()).collect();
    }

    pub fn select_none(&mut self) {
        self.visible.clear();
    }
}

/// `outer: inner: root` for display in the status line.
fn error_chain(e: probe_drum::Error) -> String {
    format!("{:#}", anyhow::Error::from(e))
}
