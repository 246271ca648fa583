use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

use super::absorbance::{self, Absorbance, Window};

// ---------------------------------------------------------------------------
// HeaderValue – a single `key=value` cell from the header line
// ---------------------------------------------------------------------------

/// A header value: numeric when it parses as a float, otherwise the raw text
/// (the instrument writes its time stamp this way).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Number(v) => write!(f, "{v}"),
            HeaderValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Number(v) => Some(*v),
            HeaderValue::Text(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one wavelength/absorbance matrix
// ---------------------------------------------------------------------------

/// A single spectrum. Wavelengths are expected in ascending order; nothing
/// re-sorts them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spectrum {
    /// Wavelength axis (nm).
    pub wavelength: Vec<f64>,
    /// Absorbance – same length as `wavelength`.
    pub absorbance: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    /// Iterate over `(wavelength, absorbance)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelength
            .iter()
            .copied()
            .zip(self.absorbance.iter().copied())
    }
}

impl FromIterator<(f64, f64)> for Spectrum {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        let (wavelength, absorbance) = iter.into_iter().unzip();
        Spectrum {
            wavelength,
            absorbance,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one parsed MXW file
// ---------------------------------------------------------------------------

/// Header key for elapsed time in deciseconds.
pub const DSEC: &str = "DSEC";
/// Header key for the electrode (pH) reading.
pub const ELE: &str = "ELE";
pub const TEMP: &str = "TEMP";
pub const VOL: &str = "VOL";
pub const CONC: &str = "CONC";
/// Free-text time stamp.
pub const TIME: &str = "TIME";

/// One parsed instrument file. Immutable once built; selecting another
/// spectrum consumes the record and returns a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    header: BTreeMap<String, HeaderValue>,
    spectra: Vec<Spectrum>,
    selected: usize,
}

impl Record {
    /// A record with spectrum 0 selected. `spectra` must not be empty for
    /// spectral queries to succeed; an empty list behaves like one empty spectrum.
    pub fn new(header: BTreeMap<String, HeaderValue>, mut spectra: Vec<Spectrum>) -> Self {
        if spectra.is_empty() {
            spectra.push(Spectrum::default());
        }
        Record {
            header,
            spectra,
            selected: 0,
        }
    }

    pub fn header(&self) -> &BTreeMap<String, HeaderValue> {
        &self.header
    }

    /// Look up a header field, failing with [`Error::MissingField`] when absent.
    pub fn field(&self, key: &str) -> Result<&HeaderValue> {
        self.header.get(key).ok_or_else(|| Error::MissingField {
            key: key.to_string(),
        })
    }

    /// Look up a numeric header field.
    pub fn number(&self, key: &str) -> Result<f64> {
        match self.field(key)? {
            HeaderValue::Number(v) => Ok(*v),
            HeaderValue::Text(s) => Err(Error::type_mismatch(format!(
                "header field '{key}' holds text '{s}', not a number"
            ))),
        }
    }

    pub fn num_spectra(&self) -> usize {
        self.spectra.len()
    }

    pub fn selected_spectrum(&self) -> usize {
        self.selected
    }

    /// Select which recorded spectrum subsequent queries use.
    pub fn with_selected_spectrum(mut self, index: usize) -> Result<Self> {
        if index >= self.num_spectra() {
            return Err(Error::Index {
                what: "spectrum",
                index,
                len: self.num_spectra(),
            });
        }
        self.selected = index;
        Ok(self)
    }

    /// The currently selected spectrum.
    pub fn spectrum(&self) -> &Spectrum {
        &self.spectra[self.selected]
    }

    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.spectrum().wavelength
    }

    /// Full absorbance column, or the mean over `window`.
    pub fn absorbance(&self, window: Option<Window>) -> Result<Absorbance<'_>> {
        absorbance::absorbance(self, window)
    }
}

// ---------------------------------------------------------------------------
// Corpus – all records of one run
// ---------------------------------------------------------------------------

/// A record together with the name of the file it was read from.
#[derive(Debug, Clone)]
pub struct Entry {
    pub source: String,
    pub record: Record,
}

/// Records in input order. Append-only.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<Entry>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: impl Into<String>, record: Record) {
        self.entries.push(Entry {
            source: source.into(),
            record,
        });
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
