use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between reading an MXW file and producing a table.
#[derive(Debug, Error)]
pub enum Error {
    #[error("file {} does not exist", path.display())]
    FileNotFound { path: PathBuf },

    #[error("reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed header token or matrix entry. `line` is 1-based.
    #[error("line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("header field '{key}' is not present in the record")]
    MissingField { key: String },

    #[error("no wavelengths within [{lmin}, {lmax}]; cannot average absorbance")]
    EmptyRange { lmin: f64, lmax: f64 },

    #[error("col {column}: unknown variable '{name}' (expected one of t, E, pH, T, V, C, S, A)")]
    UnknownVariable { name: String, column: usize },

    #[error("col {column}: {message}")]
    Syntax { column: usize, message: String },

    #[error("{message}")]
    Type { message: String },

    #[error("{what} index {index} out of range (have {len})")]
    Index {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A plot column named by text that matches none of the expressions.
    #[error("'{name}' is neither a column index nor one of the columns {columns:?}")]
    UnknownColumn { name: String, columns: Vec<String> },

    #[error("in {source_name}")]
    InSource {
        source_name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("evaluating '{expression}'")]
    InExpression {
        expression: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        Error::Type {
            message: message.into(),
        }
    }

    /// Attach the name of the file the error came from.
    pub fn in_source(self, source_name: impl Into<String>) -> Self {
        Error::InSource {
            source_name: source_name.into(),
            source: Box::new(self),
        }
    }

    /// Attach the expression text the error came from.
    pub fn in_expression(self, expression: impl Into<String>) -> Self {
        Error::InExpression {
            expression: expression.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping the source/expression wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::InSource { source, .. } | Error::InExpression { source, .. } => source.root(),
            other => other,
        }
    }
}
