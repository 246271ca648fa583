use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::model::{HeaderValue, Record, Spectrum};

// ---------------------------------------------------------------------------
// MXW text → Record
// ---------------------------------------------------------------------------

/// Parse the contents of one MXW file.
///
/// Layout:
///
/// ```text
/// DSEC=12,5<TAB>ELE=7,10<TAB>TEMP=298,15<TAB>TIME=10:42:07
/// 500 0,120
/// 502 0,130
/// ```
///
/// Commas are read as decimal points everywhere in the file. Header values that
/// are not numbers are kept as text. Matrix rows need at least two columns
/// (wavelength, absorbance); extra columns are dropped.
pub fn parse(text: &str) -> Result<Record> {
    let text = text.replace(',', ".");
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    let header = match lines.next() {
        Some((_, line)) if !line.trim().is_empty() => parse_header(line)?,
        _ => return Err(Error::format(1, "missing header line")),
    };
    let spectrum = parse_matrix(lines)?;

    log::debug!(
        "parsed record with {} header fields and {} spectral rows",
        header.len(),
        spectrum.len()
    );
    Ok(Record::new(header, vec![spectrum]))
}

fn parse_header(line: &str) -> Result<BTreeMap<String, HeaderValue>> {
    let mut header = BTreeMap::new();

    for token in line.split('\t').map(str::trim).filter(|t| !t.is_empty()) {
        let mut parts = token.split('=');
        let (key, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => (key.trim(), value.trim()),
            _ => {
                return Err(Error::format(
                    1,
                    format!("header token '{token}' is not of the form key=value"),
                ))
            }
        };
        if key.is_empty() {
            let message = format!("header token '{token}' has an empty key");
            return Err(Error::format(1, message));
        }

        let value = match value.parse::<f64>() {
            Ok(v) => HeaderValue::Number(v),
            Err(_) => HeaderValue::Text(value.to_string()),
        };
        if header.insert(key.to_string(), value).is_some() {
            let message = format!("header key '{key}' appears twice");
            return Err(Error::format(1, message));
        }
    }

    if header.is_empty() {
        return Err(Error::format(1, "missing header line"));
    }
    Ok(header)
}

fn parse_matrix<'a>(lines: impl Iterator<Item = (usize, &'a str)>) -> Result<Spectrum> {
    let mut spectrum = Spectrum::default();
    let mut columns: Option<usize> = None;

    for (line_no, line) in lines {
        let mut row = Vec::with_capacity(columns.unwrap_or(2));
        for tok in line.split_whitespace() {
            let v = tok
                .parse::<f64>()
                .map_err(|_| Error::format(line_no, format!("'{tok}' is not a number")))?;
            row.push(v);
        }
        if row.is_empty() {
            continue;
        }

        match columns {
            None if row.len() < 2 => {
                return Err(Error::format(
                    line_no,
                    format!(
                        "expected wavelength and absorbance, got {} column",
                        row.len()
                    ),
                ))
            }
            None => columns = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(Error::format(
                    line_no,
                    format!("expected {n} columns, got {}", row.len()),
                ))
            }
            Some(_) => {}
        }

        spectrum.wavelength.push(row[0]);
        spectrum.absorbance.push(row[1]);
    }

    Ok(spectrum)
}
