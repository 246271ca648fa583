//! Data layer: records, parsing, loading and absorbance queries.
//!
//! Architecture:
//! ```text
//!     .mxw files
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  existence check, read → text
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  parser   │  text → Record (header map + spectra)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌────────────┐
//!   │ absorbance  │  full column / windowed mean
//!   └────────────┘
//! ```

pub mod absorbance;
pub mod loader;
pub mod model;
pub mod parser;
