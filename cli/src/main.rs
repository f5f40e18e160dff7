use std::io::{stdout, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use log::info;

use crate::cli::{get_float_arg, get_int_arg};
use skua::{open_sketch_file, screen_sketches, ScreenOptions, SKETCH_EXT};

mod cli;

fn run() -> Result<()> {
    let matches = cli::build_cli().get_matches();

    match matches.subcommand() {
        ("screen", Some(matches)) => run_screen(matches),
        other => bail!("Unknown subcommand: {:?}", other.0),
    }
}

fn main() {
    init_logger();
    if let Err(err) = run() {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}

/// Progress goes to stderr; warnings and errors keep their level tag so they
/// stand out from the narration.
fn init_logger() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "{}: {}", level, record.args()),
        })
        .target(env_logger::Target::Stderr)
        .init();
}

fn run_screen(matches: &ArgMatches) -> Result<()> {
    let sketch_path = matches
        .value_of("SKETCH")
        .ok_or_else(|| anyhow!("Bad SKETCH"))?;
    if !sketch_path.ends_with(SKETCH_EXT) {
        bail!(
            "{} does not look like a sketch ({})",
            sketch_path,
            SKETCH_EXT
        );
    }
    let mixtures: Vec<String> = matches
        .values_of("MIXTURE")
        .ok_or_else(|| anyhow!("Bad MIXTURE"))?
        .map(String::from)
        .collect();

    let identity_min = get_float_arg(matches, "identity_min", -1.0, 1.0)?;
    let pvalue_max = get_float_arg(matches, "pvalue_max", 0.0, 1.0)?;
    let parallelism = match matches.value_of("parallelism") {
        Some(_) => get_int_arg(matches, "parallelism")?,
        None => num_cpus::get(),
    };

    info!("Loading {}...", sketch_path);
    let set = open_sketch_file(Path::new(sketch_path))
        .with_context(|| format!("unable to load sketch '{}'", sketch_path))?;

    let options = ScreenOptions {
        parallelism,
        winner_take_all: matches.is_present("winner_take_all"),
        identity_min,
        pvalue_max,
        min_coverage: 1,
    };
    let hits = screen_sketches(&set, &mixtures, &options)?;

    info!("Writing output...");
    let stdout = stdout();
    let mut out = stdout.lock();
    for hit in &hits {
        writeln!(
            out,
            "{}\t{}/{}\t{}\t{}\t{}\t{}",
            format_double(hit.identity),
            hit.shared,
            hit.sketch_size,
            hit.median_multiplicity,
            format_double(hit.pvalue),
            hit.name,
            hit.comment,
        )?;
    }
    Ok(())
}

/// Default C++ iostream rendering of a double: six significant digits,
/// scientific once the magnitude calls for it, trailing zeros trimmed.
fn format_double(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= 6 {
        let formatted = format!("{:.5e}", value);
        let (mantissa, exp) = formatted.split_at(formatted.find('e').expect("e notation"));
        format!(
            "{}{}",
            mantissa.trim_end_matches('0').trim_end_matches('.'),
            exp
        )
    } else {
        let decimals = (5 - exponent).max(0) as usize;
        let formatted = format!("{:.*}", decimals, value);
        if formatted.contains('.') {
            formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        } else {
            formatted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::format_double;

    #[test]
    fn test_format_double() {
        assert_eq!(format_double(0.0), "0");
        assert_eq!(format_double(1.0), "1");
        assert_eq!(format_double(0.5), "0.5");
        assert_eq!(format_double(0.970226333), "0.970226");
        assert_eq!(format_double(0.00012), "0.00012");
        assert_eq!(format_double(123.456789), "123.457");
        assert_eq!(format_double(1e-10), "1e-10");
        assert_eq!(format_double(1.234567e-9), "1.23457e-9");
        assert_eq!(format_double(-0.25), "-0.25");
    }
}
