use crate::error::{Error, Result};

use super::model::Record;

/// Inclusive wavelength interval `[lmin, lmax]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub lmin: f64,
    pub lmax: f64,
}

impl Window {
    pub fn new(lmin: f64, lmax: f64) -> Self {
        Window { lmin, lmax }
    }

    /// `None` when both bounds are zero, which means "no window".
    pub fn from_bounds(lmin: f64, lmax: f64) -> Option<Self> {
        if lmin == 0.0 && lmax == 0.0 {
            None
        } else {
            Some(Window::new(lmin, lmax))
        }
    }

    pub fn contains(&self, wavelength: f64) -> bool {
        wavelength >= self.lmin && wavelength <= self.lmax
    }
}

/// Result of an absorbance query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Absorbance<'a> {
    /// The whole absorbance column of the selected spectrum.
    Full(&'a [f64]),
    /// Mean absorbance inside a window.
    Mean(f64),
}

/// Full absorbance column of the selected spectrum, or its mean over `window`.
///
/// A window that matches no wavelength is an [`Error::EmptyRange`]; the mean of
/// nothing is never reported as NaN.
pub fn absorbance(record: &Record, window: Option<Window>) -> Result<Absorbance<'_>> {
    let spectrum = record.spectrum();
    let Some(window) = window else {
        return Ok(Absorbance::Full(&spectrum.absorbance));
    };

    let (sum, count) = spectrum
        .rows()
        .filter(|&(wl, _)| window.contains(wl))
        .fold((0.0, 0usize), |(sum, n), (_, a)| (sum + a, n + 1));

    if count == 0 {
        return Err(Error::EmptyRange {
            lmin: window.lmin,
            lmax: window.lmax,
        });
    }
    log::trace!(
        "averaged {count} rows within [{}, {}]",
        window.lmin,
        window.lmax
    );
    Ok(Absorbance::Mean(sum / count as f64))
}
