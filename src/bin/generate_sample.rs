//! Write a synthetic titration series as MXW files.
//!
//! Each file holds one spectrum of an acid/base indicator whose acid band
//! (430 nm) gives way to the base band (560 nm) as the pH rises. Numbers are
//! written with decimal commas, the way the instrument exports them on a
//! European locale.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Generate sample Probe Drum MXW files
#[derive(Parser)]
#[command(name = "generate_sample")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output directory (created if missing)
    #[arg(default_value = "sample_data")]
    dir: PathBuf,

    /// Number of files to write
    #[arg(default_value_t = 25)]
    count: usize,

    /// PRNG seed for the absorbance noise
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const PKA: f64 = 7.0;
const TITRANT_CONC: f64 = 0.1;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Absorbance of the indicator at wavelength `wl` for a given pH.
fn indicator_absorbance(wl: f64, ph: f64) -> f64 {
    let base_fraction = 1.0 / (1.0 + 10f64.powf(PKA - ph));
    let acid = gaussian(wl, 430.0, 30.0, 0.8);
    let base = gaussian(wl, 560.0, 35.0, 1.1);
    (1.0 - base_fraction) * acid + base_fraction * base
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn decimal_comma(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}").replace('.', ",")
}

/// The run starts at 10:00 on 1 July 2015.
const RUN_START: (i32, usize, u64) = (2015, 6, 10 * 3600);

fn days_in_month(year: i32, month: usize) -> u64 {
    const DAYS: [u64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    if month == 1 && leap {
        29
    } else {
        DAYS[month]
    }
}

/// `YYYY-MM-DD hh:mm:ss`, `elapsed` seconds after the start of the run.
fn time_stamp(elapsed: u64) -> String {
    let (mut year, mut month, start) = RUN_START;
    let total = start + elapsed;
    let (mut day, secs) = (total / 86_400, total % 86_400);
    while day >= days_in_month(year, month) {
        day -= days_in_month(year, month);
        month += 1;
        if month == 12 {
            month = 0;
            year += 1;
        }
    }
    format!(
        "{year}-{:02}-{:02} {:02}:{:02}:{:02}",
        month + 1,
        day + 1,
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    )
}

/// Contents of file `i` out of `n`.
fn mxw_file(i: usize, n: usize, rng: &mut SimpleRng) -> Result<String> {
    let progress = if n > 1 {
        i as f64 / (n - 1) as f64
    } else {
        0.0
    };
    let ph = 3.0 + 8.0 * progress;
    let dsec = 300.0 * i as f64;
    let volume = 40.0 + 10.0 * progress;
    let temp = 298.15 + rng.gauss(0.0, 0.05);
    let seconds = (dsec / 10.0) as u64;

    let mut out = String::new();
    writeln!(
        out,
        "DSEC={}\tELE={}\tTEMP={}\tVOL={}\tCONC={}\tTIME={}",
        decimal_comma(dsec, 1),
        decimal_comma(ph, 3),
        decimal_comma(temp, 2),
        decimal_comma(volume, 2),
        decimal_comma(TITRANT_CONC, 3),
        time_stamp(seconds),
    )?;

    // 380 → 700 nm, step 2
    for wl in (380..=700).step_by(2) {
        let wl = wl as f64;
        let a = indicator_absorbance(wl, ph) + rng.gauss(0.0, 0.003);
        writeln!(out, "{wl:.0}\t{}", decimal_comma(a, 4))?;
    }
    Ok(out)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("Failed to create {}", args.dir.display()))?;

    let mut rng = SimpleRng::new(args.seed);
    for i in 0..args.count {
        let path = args.dir.join(format!("titration_{:04}.mxw", i + 1));
        let contents = mxw_file(i, args.count, &mut rng)?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("wrote {}", path.display());
    }

    let dir = args.dir.display();
    println!("Wrote {} MXW files to {dir}", args.count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_files_parse() {
        let mut rng = SimpleRng::new(1);
        let text = mxw_file(3, 10, &mut rng).unwrap();
        let rec = probe_drum::data::parser::parse(&text).unwrap();
        assert_eq!(rec.number("DSEC").unwrap(), 900.0);
        assert!(rec.field("TIME").is_ok());
        assert_eq!(rec.spectrum().len(), 161);
    }

    #[test]
    fn time_stamps_roll_over_days_months_and_years() {
        const DAY: u64 = 86_400;
        let midnight = 14 * 3600;
        assert_eq!(time_stamp(0), "2015-07-01 10:00:00");
        assert_eq!(time_stamp(90), "2015-07-01 10:01:30");
        assert_eq!(time_stamp(midnight), "2015-07-02 00:00:00");
        assert_eq!(time_stamp(midnight + 30 * DAY), "2015-08-01 00:00:00");
        assert_eq!(time_stamp(midnight + 183 * DAY), "2016-01-01 00:00:00");
        assert_eq!(time_stamp(midnight + 242 * DAY), "2016-02-29 00:00:00");
    }

    #[test]
    fn late_files_keep_a_valid_clock() {
        let mut rng = SimpleRng::new(7);
        let text = mxw_file(5000, 5001, &mut rng).unwrap();
        let rec = probe_drum::data::parser::parse(&text).unwrap();
        let stamp = rec.field("TIME").unwrap().to_string();
        assert_eq!(stamp, "2015-07-03 03:40:00");
    }

    #[test]
    fn base_band_grows_with_ph() {
        let acid = indicator_absorbance(560.0, 3.0);
        let base = indicator_absorbance(560.0, 11.0);
        assert!(base > acid);
    }
}
