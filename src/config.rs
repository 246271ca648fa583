//! TOML settings file, so a lab can keep its usual columns in one place:
//!
//! ```toml
//! # probe-drum.toml
//! [table]
//! format = ["t", "E", "A(500,510)"]
//! output = "csv"
//! header = true
//!
//! [plot]
//! columns = [0, 2]
//! ```
//!
//! Command line flags win over the file; the file wins over built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::expr::DEFAULT_FORMAT;
use crate::table::{ColumnRef, OutputFormat};

/// Name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "probe-drum.toml";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub table: TableConfig,

    #[serde(default)]
    pub plot: PlotConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    /// Column expressions.
    pub format: Option<Vec<String>>,

    pub output: Option<OutputFormat>,

    /// Print column names first.
    pub header: Option<bool>,

    /// Spectrum index to select in every record.
    pub spectrum: Option<usize>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlotConfig {
    /// x and y column indices.
    pub columns: Option<[usize; 2]>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// The explicit file if given, else `probe-drum.toml` when present, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let implicit = PathBuf::from(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            log::info!("using settings from {}", implicit.display());
            return Self::from_file(&implicit);
        }
        Ok(Self::default())
    }
}

/// Settings given on the command line. `None` and `false` defer to the file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Overrides {
    pub format: Option<Vec<String>>,
    /// Appends `A(lmin,lmax)` to the format, whichever source it came from.
    pub lrange: Option<[f64; 2]>,
    pub output: Option<OutputFormat>,
    pub header: bool,
    pub spectrum: Option<usize>,
    pub plot_columns: Option<[ColumnRef; 2]>,
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub format: Vec<String>,
    pub output: OutputFormat,
    pub header: bool,
    pub spectrum: Option<usize>,
    pub plot_columns: [ColumnRef; 2],
}

impl Settings {
    /// Merge command line values over the file over built-in defaults.
    pub fn resolve(overrides: Overrides, config: Config) -> Self {
        let mut format = overrides
            .format
            .or(config.table.format)
            .unwrap_or_else(|| DEFAULT_FORMAT.iter().map(|s| s.to_string()).collect());
        if let Some([lmin, lmax]) = overrides.lrange {
            format.push(format!("A({lmin},{lmax})"));
        }

        let plot_columns = overrides.plot_columns.unwrap_or_else(|| {
            let [x, y] = config.plot.columns.unwrap_or([0, 1]);
            [ColumnRef::Index(x), ColumnRef::Index(y)]
        });

        let output = overrides.output.or(config.table.output);
        Settings {
            format,
            output: output.unwrap_or_default(),
            header: overrides.header || config.table.header.unwrap_or(false),
            spectrum: overrides.spectrum.or(config.table.spectrum),
            plot_columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [table]
            format = ["t", "pH", "A(500,510)"]
            output = "json"
            header = true
            spectrum = 0

            [plot]
            columns = [0, 2]
        "#;

        let config = Config::from_str(toml).unwrap();
        let format = ["t", "pH", "A(500,510)"].map(String::from).to_vec();
        assert_eq!(config.table.format, Some(format));
        assert_eq!(config.table.output, Some(OutputFormat::Json));
        assert_eq!(config.table.header, Some(true));
        assert_eq!(config.table.spectrum, Some(0));
        assert_eq!(config.plot.columns, Some([0, 2]));
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_str("[plot]\ncolumns = [1, 0]\n").unwrap();
        assert_eq!(config.plot.columns, Some([1, 0]));
        assert_eq!(config.table, TableConfig::default());
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(Config::from_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let typo = "[table]\nfromat = [\"t\"]\n";
        assert!(Config::from_str(typo).is_err());
        let bad_output = "[table]\noutput = \"xml\"\n";
        assert!(Config::from_str(bad_output).is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::discover(Some(&missing)).is_err());
    }

    fn file_settings() -> Config {
        Config::from_str(
            r#"
            [table]
            format = ["t", "pH"]
            output = "tsv"
            header = true
            spectrum = 1

            [plot]
            columns = [1, 0]
        "#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_without_file_or_flags() {
        let settings = Settings::resolve(Overrides::default(), Config::default());
        assert_eq!(settings.format, vec!["t", "E", "C"]);
        assert_eq!(settings.output, OutputFormat::Text);
        assert!(!settings.header);
        assert_eq!(settings.spectrum, None);
        assert_eq!(
            settings.plot_columns,
            [ColumnRef::Index(0), ColumnRef::Index(1)]
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let settings = Settings::resolve(Overrides::default(), file_settings());
        assert_eq!(settings.format, vec!["t", "pH"]);
        assert_eq!(settings.output, OutputFormat::Tsv);
        assert!(settings.header);
        assert_eq!(settings.spectrum, Some(1));
        assert_eq!(
            settings.plot_columns,
            [ColumnRef::Index(1), ColumnRef::Index(0)]
        );
    }

    #[test]
    fn test_command_line_overrides_file() {
        let overrides = Overrides {
            format: Some(vec!["V".to_string()]),
            output: Some(OutputFormat::Json),
            spectrum: Some(0),
            plot_columns: Some(["V".into(), "0".into()]),
            ..Overrides::default()
        };
        let settings = Settings::resolve(overrides, file_settings());
        assert_eq!(settings.format, vec!["V"]);
        assert_eq!(settings.output, OutputFormat::Json);
        assert_eq!(settings.spectrum, Some(0));
        assert_eq!(
            settings.plot_columns,
            [ColumnRef::Name("V".to_string()), ColumnRef::Index(0)]
        );
        // a flag can switch the header on but not off
        assert!(settings.header);
    }

    #[test]
    fn test_lrange_appends_window_average() {
        let overrides = Overrides {
            lrange: Some([500.0, 510.5]),
            ..Overrides::default()
        };
        let settings = Settings::resolve(overrides.clone(), Config::default());
        assert_eq!(settings.format, vec!["t", "E", "C", "A(500,510.5)"]);

        let settings = Settings::resolve(overrides, file_settings());
        assert_eq!(settings.format, vec!["t", "pH", "A(500,510.5)"]);
    }
}
