//! Expression engine for deriving per-record values from text formulas.
//!
//! An expression is arithmetic (`+ - * / ^`, parentheses, numeric literals)
//! over a fixed vocabulary bound to the record being evaluated:
//!
//! | name        | value                                        |
//! |-------------|----------------------------------------------|
//! | `t`         | `DSEC` header field                          |
//! | `E`, `pH`   | `ELE` header field                           |
//! | `T`         | `TEMP` header field                          |
//! | `V`         | `VOL` header field                           |
//! | `C`         | `CONC` header field                          |
//! | `S`         | selected spectral matrix                     |
//! | `A`         | absorbance column; `A(lmin, lmax)` its mean   |
//!
//! Helper functions: `min`, `max`, `argmin`, `argmax`, `mean`, `sum`, `len`,
//! `abs`, `sqrt`, `log`, `log10`, `exp`, `pow`, and `wl(S)` / `ab(S)` for the
//! matrix columns. `x[i]` indexes a series (or a matrix row), so the wavelength
//! of the absorbance peak is `wl(S)[argmax(A)]`.
//!
//! Expressions are parsed into a small AST and interpreted; nothing outside
//! this grammar can be expressed.

mod eval;
mod parse;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::data::model::{Record, Spectrum};
use crate::error::{Error, Result};

use eval::Binding;
use parse::Expr;

// ---------------------------------------------------------------------------
// Value – what an expression evaluates to
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    /// A text header field, passed through unchanged.
    Text(String),
    Series(Vec<f64>),
    Matrix(Spectrum),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "a number",
            Value::Text(_) => "text",
            Value::Series(_) => "a series",
            Value::Matrix(_) => "the spectral matrix",
        }
    }
}

fn write_series(f: &mut fmt::Formatter<'_>, xs: &[f64]) -> fmt::Result {
    write!(f, "[")?;
    for (i, x) in xs.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{x}")?;
    }
    write!(f, "]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Series(xs) => write_series(f, xs),
            Value::Matrix(m) => {
                write!(f, "[")?;
                for (i, (wl, a)) in m.rows().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write_series(f, &[wl, a])?;
                }
                write!(f, "]")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Expression – one compiled formula
// ---------------------------------------------------------------------------

/// A parsed expression, reusable across records.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parse `text`. Fails with [`Error::Syntax`] or [`Error::UnknownVariable`].
    pub fn compile(text: &str) -> Result<Self> {
        let ast = parse::parse(text).map_err(|e| e.in_expression(text))?;
        Ok(Expression {
            source: text.to_string(),
            ast,
        })
    }

    /// The text the expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against one record.
    pub fn eval(&self, record: &Record) -> Result<Value> {
        Binding::new(record)
            .eval(&self.ast)
            .map_err(|e| e.in_expression(self.source.clone()))
    }
}

impl FromStr for Expression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Expression::compile(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ---------------------------------------------------------------------------
// FormatSpec – the ordered list of output columns
// ---------------------------------------------------------------------------

/// Column formulas used when none are given.
pub const DEFAULT_FORMAT: [&str; 3] = ["t", "E", "C"];

/// Ordered list of compiled expressions; one output column each.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpec {
    expressions: Vec<Expression>,
}

impl FormatSpec {
    pub fn compile<S: AsRef<str>>(texts: &[S]) -> Result<Self> {
        let expressions = texts
            .iter()
            .map(|t| Expression::compile(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(FormatSpec { expressions })
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    /// Column names, i.e. the source text of each expression.
    pub fn columns(&self) -> Vec<String> {
        self.expressions.iter().map(|e| e.source.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// One value per expression, in order.
    pub fn evaluate(&self, record: &Record) -> Result<Vec<Value>> {
        self.expressions.iter().map(|e| e.eval(record)).collect()
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec::compile(&DEFAULT_FORMAT).expect("default format is valid")
    }
}

/// Compile and evaluate `expressions` against `record` in one go.
pub fn evaluate<S: AsRef<str>>(record: &Record, expressions: &[S]) -> Result<Vec<Value>> {
    FormatSpec::compile(expressions)?.evaluate(record)
}
