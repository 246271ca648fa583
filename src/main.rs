//! # probe-drum
//!
//! Tabulate and plot Probe Drum MXW titration files.
//!
//! ```bash
//! # time, pH and concentration of every file (default columns)
//! probe-drum run/*.mxw
//!
//! # pH against the mean absorbance between 500 and 510 nm, as CSV
//! probe-drum run/*.mxw -o csv --header --format pH "A(500,510)"
//!
//! # same, and plot column 1 against column 0
//! probe-drum run/*.mxw --lrange 500 510 --plot --plotfmt pH "A(500,510)"
//! ```

mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;

use probe_drum::config::{Config, Overrides, Settings};
use probe_drum::data::loader;
use probe_drum::expr::FormatSpec;
use probe_drum::table::{OutputFormat, Table};

use crate::state::AppState;

/// Read Probe Drum MXW data files
#[derive(Parser)]
#[command(name = "probe-drum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Settings file (defaults to ./probe-drum.toml when present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Column expressions, e.g. `t pH "A(500,510)"` (default: t E C)
    #[arg(short, long, num_args = 1.., value_name = "EXPR")]
    format: Option<Vec<String>>,

    /// Append a column with the mean absorbance in this wavelength range [nm]
    #[arg(long, num_args = 2, value_names = ["LMIN", "LMAX"])]
    lrange: Option<Vec<f64>>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Print column names before the rows
    #[arg(long)]
    header: bool,

    /// Spectrum index to use in every file
    #[arg(long, value_name = "N")]
    spectrum: Option<usize>,

    /// Open a plot window after printing the table
    #[arg(long)]
    plot: bool,

    /// Columns to plot, as indices or expression text (default: 0 1)
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    plotfmt: Option<Vec<String>>,

    /// MXW files, processed in the order given
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env = env_logger::Env::default().default_filter_or(log_level);
    env_logger::Builder::from_env(env).init();

    let config = Config::discover(cli.config.as_deref())?;
    let overrides = Overrides {
        format: cli.format,
        lrange: cli.lrange.map(|r| [r[0], r[1]]),
        output: cli.output,
        header: cli.header,
        spectrum: cli.spectrum,
        plot_columns: cli
            .plotfmt
            .map(|r| [r[0].as_str().into(), r[1].as_str().into()]),
    };
    let settings = Settings::resolve(overrides, config);

    let format = FormatSpec::compile(&settings.format).context("Invalid output format")?;

    let corpus = match settings.spectrum {
        Some(index) => loader::load_corpus_with_spectrum(&cli.files, index),
        None => loader::load_corpus(&cli.files),
    }
    .context("Failed to load input files")?;

    let table = Table::build(&corpus, &format).context("Failed to evaluate output format")?;
    let stdout = std::io::stdout().lock();
    table.write(stdout, settings.output, settings.header)?;

    if cli.plot {
        let [x, y] = &settings.plot_columns;
        let columns = [table.resolve_column(x)?, table.resolve_column(y)?];
        // fail here rather than inside the window
        table
            .column_pair(columns[0], columns[1])
            .context("Cannot plot the selected columns")?;

        info!("Opening plot window for columns {columns:?}");
        let state = AppState::new(corpus, format, settings.spectrum, columns);
        app::run(state).map_err(|e| anyhow!("Plot window failed: {e}"))?;
    }

    Ok(())
}
