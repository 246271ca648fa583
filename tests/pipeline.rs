//! End-to-end tests: MXW files on disk → corpus → table → rendered output.

use std::fs;
use std::path::PathBuf;

use probe_drum::config::{Config, Overrides, Settings};
use probe_drum::data::loader;
use probe_drum::expr::{self, FormatSpec, Value};
use probe_drum::table::{OutputFormat, Table};
use probe_drum::Error;
use tempfile::{tempdir, TempDir};

const SCENARIO: &str = "DSEC=12.5\tELE=7.10\tTEMP=298.15\tVOL=40.0\tCONC=1.5\n\
                        500 0.120\n\
                        502 0.130\n\
                        504 0.150\n";

/// A titration series written with decimal commas, as a European-locale export.
fn write_series(dir: &TempDir) -> Vec<PathBuf> {
    (0..4)
        .map(|i| {
            let path = dir.path().join(format!("run_{i:02}.mxw"));
            let text = format!(
                "DSEC={}\tELE={},5\tTEMP=25,0\tVOL=40,0\tCONC=0,1\tTIME=10:0{i}:00\n\
                 500\t0,{}\n\
                 502\t0,{}\n\
                 504\t0,{}\n",
                i * 100,
                4 + i,
                100 + i,
                200 + i,
                300 + i,
            );
            fs::write(&path, text).unwrap();
            path
        })
        .collect()
}

fn render(table: &Table, format: OutputFormat) -> String {
    let mut buf = Vec::new();
    table.write(&mut buf, format, false).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn scenario_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scenario.mxw");
    fs::write(&path, SCENARIO).unwrap();

    let record = loader::read_record(&path).unwrap();
    let values = expr::evaluate(&record, &["t", "E", "A(500,504)"]).unwrap();
    assert_eq!(values[0], Value::Number(12.5));
    assert_eq!(values[1], Value::Number(7.10));
    let a = values[2].as_f64().unwrap();
    assert!((a - 0.13333333333333333).abs() < 1e-9);

    let t = expr::evaluate(&record, &["T+298.15"]).unwrap();
    assert_eq!(t, vec![Value::Number(298.15 + 298.15)]);

    let err = expr::evaluate(&record, &["A(600,700)"]).unwrap_err();
    assert!(matches!(err.root(), Error::EmptyRange { .. }));
}

#[test]
fn series_table_in_file_order() {
    let dir = tempdir().unwrap();
    let mut paths = write_series(&dir);
    paths.reverse();

    let corpus = loader::load_corpus(&paths).unwrap();
    let format = FormatSpec::compile(&["t", "pH", "A(500,504)", "wl(S)[argmax(A)]"]).unwrap();
    let table = Table::build(&corpus, &format).unwrap();

    let times: Vec<f64> = table
        .rows()
        .iter()
        .map(|r| r[0].as_f64().unwrap())
        .collect();
    assert_eq!(times, vec![300.0, 200.0, 100.0, 0.0]);
    assert_eq!(table.rows()[0][1], Value::Number(7.5));
    assert_eq!(table.rows()[3][3], Value::Number(504.0));

    let points = table.column_pair(1, 2).unwrap();
    assert_eq!(points.len(), 4);
    assert_eq!(points[3][0], 4.5);
    assert!((points[3][1] - 0.2).abs() < 1e-12);
}

#[test]
fn default_format_prints_time_ph_concentration() {
    let dir = tempdir().unwrap();
    let paths = write_series(&dir);
    let corpus = loader::load_corpus(&paths[..2]).unwrap();
    let table = Table::build(&corpus, &FormatSpec::default()).unwrap();
    let text = render(&table, OutputFormat::Text);
    assert_eq!(text, "0 4.5 0.1\n100 5.5 0.1\n");
}

#[test]
fn time_stamp_passes_through_as_text() {
    let dir = tempdir().unwrap();
    let paths = write_series(&dir);
    let record = loader::read_record(&paths[2]).unwrap();
    assert_eq!(record.field("TIME").unwrap().to_string(), "10:02:00");
}

#[test]
fn first_failure_aborts_the_run() {
    let dir = tempdir().unwrap();
    let mut paths = write_series(&dir);
    let bad = dir.path().join("broken.mxw");
    fs::write(&bad, "DSEC=1\tELE7.10\n500 0.1\n").unwrap();
    paths.insert(1, bad);
    paths.push(dir.path().join("never_read.mxw"));

    let err = loader::load_corpus(&paths).unwrap_err();
    match &err {
        Error::InSource { source_name, .. } => assert!(source_name.ends_with("broken.mxw")),
        other => panic!("expected InSource, got {other:?}"),
    }
    assert!(matches!(err.root(), Error::Format { line: 1, .. }));
}

#[test]
fn missing_file_is_named() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.mxw");
    let err = loader::load_corpus(&[&missing]).unwrap_err();
    match err {
        Error::FileNotFound { path } => assert_eq!(path, missing),
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[test]
fn plot_columns_are_bounds_checked() {
    let dir = tempdir().unwrap();
    let paths = write_series(&dir);
    let corpus = loader::load_corpus(&paths).unwrap();
    let table = Table::build(&corpus, &FormatSpec::compile(&["t", "E"]).unwrap()).unwrap();
    for (x, y) in [(0, 5), (2, 0)] {
        match table.column_pair(x, y) {
            Err(Error::Index { what, .. }) => assert_eq!(what, "column"),
            other => panic!("expected Index, got {other:?}"),
        }
    }
}

#[test]
fn csv_output_round_trips_through_csv_reader() {
    let dir = tempdir().unwrap();
    let paths = write_series(&dir);
    let corpus = loader::load_corpus(&paths).unwrap();
    let format = FormatSpec::compile(&["t", "A(502,502)"]).unwrap();
    let table = Table::build(&corpus, &format).unwrap();

    let mut buf = Vec::new();
    table.write(&mut buf, OutputFormat::Csv, true).unwrap();
    let mut reader = csv::Reader::from_reader(buf.as_slice());
    assert_eq!(reader.headers().unwrap(), vec!["t", "A(502,502)"]);
    let rows: Vec<Vec<f64>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(|v| v.parse().unwrap()).collect())
        .collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1], vec![100.0, 0.201]);
}

#[test]
fn settings_file_and_flags_drive_the_run() {
    let dir = tempdir().unwrap();
    let paths = write_series(&dir);
    let config_path = dir.path().join("probe-drum.toml");
    fs::write(
        &config_path,
        "[table]\nformat = [\"t\", \"pH\"]\noutput = \"csv\"\n\n[plot]\ncolumns = [1, 2]\n",
    )
    .unwrap();

    let overrides = Overrides {
        lrange: Some([502.0, 502.0]),
        header: true,
        ..Overrides::default()
    };
    let config = Config::discover(Some(&config_path)).unwrap();
    let settings = Settings::resolve(overrides, config);

    let corpus = loader::load_corpus(&paths[..1]).unwrap();
    let format = FormatSpec::compile(&settings.format).unwrap();
    let table = Table::build(&corpus, &format).unwrap();

    let mut buf = Vec::new();
    table
        .write(&mut buf, settings.output, settings.header)
        .unwrap();
    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "t,pH,\"A(502,502)\"\n0,4.5,0.2\n"
    );

    let [x, y] = &settings.plot_columns;
    let columns = [
        table.resolve_column(x).unwrap(),
        table.resolve_column(y).unwrap(),
    ];
    assert_eq!(
        table.column_pair(columns[0], columns[1]).unwrap(),
        vec![[4.5, 0.2]]
    );
}
