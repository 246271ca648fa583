use std::path::Path;

use crate::error::{Error, Result};

use super::model::{Corpus, Record};
use super::parser;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read and parse a single MXW file.
///
/// The format is ASCII; anything that is not valid UTF-8 is replaced rather
/// than rejected so that a stray byte ends up as a format error with a line
/// number instead of an opaque decoding failure.
pub fn read_record(path: &Path) -> Result<Record> {
    if !path.is_file() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let record = parser::parse(&text).map_err(|e| e.in_source(path.display().to_string()))?;
    log::debug!(
        "loaded {} ({} header fields, {} rows)",
        path.display(),
        record.header().len(),
        record.spectrum().len()
    );
    Ok(record)
}

/// Load every file in order. Stops at the first failure.
pub fn load_corpus<P: AsRef<Path>>(paths: &[P]) -> Result<Corpus> {
    let mut corpus = Corpus::new();
    for path in paths {
        let path = path.as_ref();
        let record = read_record(path)?;
        corpus.push(path.display().to_string(), record);
    }
    log::info!("loaded {} MXW files", corpus.len());
    Ok(corpus)
}

/// Same as [`load_corpus`] but selects spectrum `index` in every record.
pub fn load_corpus_with_spectrum<P: AsRef<Path>>(paths: &[P], index: usize) -> Result<Corpus> {
    let mut corpus = Corpus::new();
    for path in paths {
        let path = path.as_ref();
        let name = path.display().to_string();
        let record = read_record(path)?
            .with_selected_spectrum(index)
            .map_err(|e| e.in_source(name.clone()))?;
        corpus.push(name, record);
    }
    log::info!("loaded {} MXW files (spectrum {index})", corpus.len());
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_is_reported_before_parsing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.mxw");
        match read_record(&path) {
            Err(Error::FileNotFound { path: p }) => assert_eq!(p, path),
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempdir().unwrap();
        let result = read_record(dir.path());
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn corpus_follows_argument_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mxw");
        let b = dir.path().join("b.mxw");
        fs::write(&a, "DSEC=1\n500 0.1\n").unwrap();
        fs::write(&b, "DSEC=2\n500 0.2\n").unwrap();

        let corpus = load_corpus(&[&b, &a]).unwrap();
        let times: Vec<f64> = corpus
            .iter()
            .map(|e| e.record.number("DSEC").unwrap())
            .collect();
        assert_eq!(times, vec![2.0, 1.0]);
        assert!(corpus.entries()[0].source.ends_with("b.mxw"));
    }

    #[test]
    fn format_errors_name_the_file() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("bad.mxw");
        fs::write(&bad, "ELE7.10\n").unwrap();
        let err = load_corpus(&[&bad]).unwrap_err();
        match &err {
            Error::InSource { source_name, .. } => assert!(source_name.ends_with("bad.mxw")),
            other => panic!("expected InSource, got {other:?}"),
        }
        assert!(matches!(err.root(), Error::Format { line: 1, .. }));
    }

    #[test]
    fn spectrum_index_is_checked_per_file() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mxw");
        fs::write(&a, "DSEC=1\n500 0.1\n").unwrap();
        assert!(load_corpus_with_spectrum(&[&a], 0).is_ok());
        let err = load_corpus_with_spectrum(&[&a], 1).unwrap_err();
        assert!(matches!(
            err.root(),
            Error::Index {
                what: "spectrum",
                ..
            }
        ));
    }
}
