use crate::data::absorbance::{Absorbance, Window};
use crate::data::model::{self, HeaderValue, Record};
use crate::error::{Error, Result};

use super::parse::{BinOp, Expr, Func, UnaryOp, Var};
use super::Value;

/// Per-record view of the variables an expression can name. Built for one
/// evaluation and dropped right after.
pub(crate) struct Binding<'a> {
    record: &'a Record,
}

impl<'a> Binding<'a> {
    pub(crate) fn new(record: &'a Record) -> Self {
        Binding { record }
    }

    fn header(&self, key: &str) -> Result<Value> {
        Ok(match self.record.field(key)? {
            HeaderValue::Number(v) => Value::Number(*v),
            HeaderValue::Text(s) => Value::Text(s.clone()),
        })
    }

    fn var(&self, var: Var) -> Result<Value> {
        match var {
            Var::Time => self.header(model::DSEC),
            Var::Electrode => self.header(model::ELE),
            Var::Temperature => self.header(model::TEMP),
            Var::Volume => self.header(model::VOL),
            Var::Concentration => self.header(model::CONC),
            Var::Spectrum => Ok(Value::Matrix(self.record.spectrum().clone())),
            Var::Absorbance => self.absorbance(None),
        }
    }

    fn absorbance(&self, window: Option<Window>) -> Result<Value> {
        Ok(match self.record.absorbance(window)? {
            Absorbance::Full(column) => Value::Series(column.to_vec()),
            Absorbance::Mean(m) => Value::Number(m),
        })
    }

    pub(crate) fn eval(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Var(v) => self.var(*v),
            Expr::Unary(op, e) => {
                let v = self.eval(e)?;
                match op {
                    UnaryOp::Plus => map(v, "unary +", |x| x),
                    UnaryOp::Neg => map(v, "unary -", |x| -x),
                }
            }
            Expr::Binary(op, a, b) => {
                let lhs = self.eval(a)?;
                let rhs = self.eval(b)?;
                binary(*op, lhs, rhs)
            }
            Expr::Call(func, args) => self.call(*func, args),
            Expr::Index(base, index) => {
                let base = self.eval(base)?;
                let index = self.eval(index)?;
                subscript(base, index)
            }
        }
    }

    fn call(&self, func: Func, args: &[Expr]) -> Result<Value> {
        if func == Func::Absorbance {
            let window = match args {
                [] => None,
                [lmin, lmax] => {
                    let lmin = scalar(self.eval(lmin)?, "A() lower bound")?;
                    let lmax = scalar(self.eval(lmax)?, "A() upper bound")?;
                    Window::from_bounds(lmin, lmax)
                }
                _ => unreachable!("arity checked by the parser"),
            };
            return self.absorbance(window);
        }

        let values = args
            .iter()
            .map(|a| self.eval(a))
            .collect::<Result<Vec<_>>>()?;

        match func {
            Func::Absorbance => unreachable!("handled above"),
            Func::Min => {
                let xs = flatten(values, "min")?;
                extreme(&xs, "min", |a, b| b < a).map(|i| Value::Number(xs[i]))
            }
            Func::Max => {
                let xs = flatten(values, "max")?;
                extreme(&xs, "max", |a, b| b > a).map(|i| Value::Number(xs[i]))
            }
            Func::ArgMin => {
                let xs = flatten(values, "argmin")?;
                extreme(&xs, "argmin", |a, b| b < a).map(|i| Value::Number(i as f64))
            }
            Func::ArgMax => {
                let xs = flatten(values, "argmax")?;
                extreme(&xs, "argmax", |a, b| b > a).map(|i| Value::Number(i as f64))
            }
            Func::Mean => {
                let xs = flatten(values, "mean")?;
                if xs.is_empty() {
                    return Err(Error::type_mismatch("mean() of an empty series"));
                }
                Ok(Value::Number(xs.iter().sum::<f64>() / xs.len() as f64))
            }
            Func::Sum => Ok(Value::Number(flatten(values, "sum")?.iter().sum())),
            Func::Len => Ok(Value::Number(flatten(values, "len")?.len() as f64)),
            Func::Abs => map(one(values), "abs()", f64::abs),
            Func::Sqrt => map(one(values), "sqrt()", f64::sqrt),
            Func::Log => map(one(values), "log()", f64::ln),
            Func::Log10 => map(one(values), "log10()", f64::log10),
            Func::Exp => map(one(values), "exp()", f64::exp),
            Func::Pow => {
                let mut it = values.into_iter();
                match (it.next(), it.next()) {
                    (Some(a), Some(b)) => binary(BinOp::Pow, a, b),
                    _ => unreachable!("arity checked by the parser"),
                }
            }
            Func::Wl | Func::Ab => match one(values) {
                Value::Matrix(m) if func == Func::Wl => Ok(Value::Series(m.wavelength)),
                Value::Matrix(m) => Ok(Value::Series(m.absorbance)),
                other => Err(Error::type_mismatch(format!(
                    "{}() expects the spectral matrix S, got {}",
                    func.name(),
                    other.kind()
                ))),
            },
        }
    }
}

fn one(values: Vec<Value>) -> Value {
    values
        .into_iter()
        .next()
        .expect("arity checked by the parser")
}

fn scalar(v: Value, what: &str) -> Result<f64> {
    match v {
        Value::Number(x) => Ok(x),
        other => Err(Error::type_mismatch(format!(
            "{what} must be a number, got {}",
            other.kind()
        ))),
    }
}

/// Apply `f` to a number or to every element of a series.
fn map(v: Value, what: &str, f: impl Fn(f64) -> f64) -> Result<Value> {
    match v {
        Value::Number(x) => Ok(Value::Number(f(x))),
        Value::Series(xs) => Ok(Value::Series(xs.into_iter().map(f).collect())),
        other => Err(Error::type_mismatch(format!(
            "cannot apply {what} to {}",
            other.kind()
        ))),
    }
}

fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
    let f = |a: f64, b: f64| match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Pow => a.powf(b),
    };
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(a, b))),
        (Value::Series(xs), Value::Number(b)) => {
            Ok(Value::Series(xs.into_iter().map(|a| f(a, b)).collect()))
        }
        (Value::Number(a), Value::Series(ys)) => {
            Ok(Value::Series(ys.into_iter().map(|b| f(a, b)).collect()))
        }
        (Value::Series(xs), Value::Series(ys)) => {
            if xs.len() != ys.len() {
                return Err(Error::type_mismatch(format!(
                    "'{}' on series of different length ({} and {})",
                    op.symbol(),
                    xs.len(),
                    ys.len()
                )));
            }
            Ok(Value::Series(
                xs.into_iter().zip(ys).map(|(a, b)| f(a, b)).collect(),
            ))
        }
        (a, b) => Err(Error::type_mismatch(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            a.kind(),
            b.kind()
        ))),
    }
}

fn subscript(base: Value, index: Value) -> Result<Value> {
    let raw = scalar(index, "index")?;
    if raw < 0.0 || raw.fract() != 0.0 || !raw.is_finite() {
        return Err(Error::type_mismatch(format!(
            "index must be a non-negative integer, got {raw}"
        )));
    }
    let i = raw as usize;
    match base {
        Value::Series(xs) => xs.get(i).copied().map(Value::Number).ok_or(Error::Index {
            what: "series",
            index: i,
            len: xs.len(),
        }),
        Value::Matrix(m) => match (m.wavelength.get(i), m.absorbance.get(i)) {
            (Some(&wl), Some(&a)) => Ok(Value::Series(vec![wl, a])),
            _ => Err(Error::Index {
                what: "spectrum row",
                index: i,
                len: m.len(),
            }),
        },
        other => {
            let message = format!("cannot index {}", other.kind());
            Err(Error::type_mismatch(message))
        }
    }
}

/// Numbers and series flattened into one list, for the aggregate helpers.
fn flatten(values: Vec<Value>, what: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for v in values {
        match v {
            Value::Number(x) => out.push(x),
            Value::Series(xs) => out.extend(xs),
            other => {
                return Err(Error::type_mismatch(format!(
                    "{what}() expects numbers or series, got {}",
                    other.kind()
                )))
            }
        }
    }
    Ok(out)
}

/// Position of the first element that no later element beats under `better`.
fn extreme(xs: &[f64], what: &str, better: impl Fn(f64, f64) -> bool) -> Result<usize> {
    if xs.is_empty() {
        let message = format!("{what}() of an empty series");
        return Err(Error::type_mismatch(message));
    }
    let mut best = 0;
    for (i, &x) in xs.iter().enumerate().skip(1) {
        if better(xs[best], x) {
            best = i;
        }
    }
    Ok(best)
}
