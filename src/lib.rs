//! Reader and evaluator for Probe Drum MXW titration files.
//!
//! ```text
//!  .mxw text ──parser──▶ Record ──expr──▶ values ──table──▶ rows
//! ```
//!
//! ```no_run
//! use probe_drum::{data::loader, expr::FormatSpec, table::{OutputFormat, Table}};
//!
//! # fn main() -> probe_drum::Result<()> {
//! let corpus = loader::load_corpus(&["titration_0001.mxw", "titration_0002.mxw"])?;
//! let format = FormatSpec::compile(&["t", "pH", "A(500,510)"])?;
//! let table = Table::build(&corpus, &format)?;
//! table.write(std::io::stdout(), OutputFormat::Text, false)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod expr;
pub mod table;

pub use error::{Error, Result};
