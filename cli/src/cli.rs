use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use clap::{crate_authors, crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};

pub fn build_cli() -> App<'static, 'static> {
    App::new("skua")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Containment screening of MinHash sketches against sequence mixtures")
        .setting(AppSettings::VersionlessSubcommands)
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(screen_command())
}

fn screen_command() -> App<'static, 'static> {
    SubCommand::with_name("screen")
        .about("Determine how well reference sketches are contained in a mixture of sequences")
        .arg(
            Arg::with_name("SKETCH")
                .help("Reference sketch file (.msh)")
                .required(true),
        )
        .arg(
            Arg::with_name("MIXTURE")
                .help(
                    "Mixture sequence file(s): contigs or reads, FASTA or FASTQ, \
                     optionally gzipped. '-' reads from standard input and is only \
                     accepted as the first mixture argument",
                )
                .multiple(true)
                .required(true),
        )
        .arg(
            Arg::with_name("parallelism")
                .short("p")
                .long("parallelism")
                .takes_value(true)
                .help("Number of hashing threads [default: all logical cpus]"),
        )
        .arg(
            Arg::with_name("winner_take_all")
                .short("w")
                .long("winner-take-all")
                .help(
                    "After counting, reassign hashes held by multiple references to \
                     the one with the best identity (ties to the larger reference), \
                     removing redundancy from the output",
                ),
        )
        .arg(
            Arg::with_name("identity_min")
                .short("i")
                .long("min-identity")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0")
                .help(
                    "Minimum identity to report. Inclusive unless set to zero, in \
                     which case only identities greater than zero are reported; set \
                     to -1 to report everything",
                ),
        )
        .arg(
            Arg::with_name("pvalue_max")
                .short("v")
                .long("max-pvalue")
                .takes_value(true)
                .default_value("1.0")
                .help("Maximum p-value to report"),
        )
}

pub fn get_int_arg<T: FromStr>(matches: &ArgMatches, key: &str) -> Result<T> {
    let display_key = key.replace('_', "-");
    matches
        .value_of(key)
        .ok_or_else(|| anyhow!("Bad {}", display_key))?
        .parse::<T>()
        .map_err(|_| anyhow!("{} must be a positive integer", display_key))
}

pub fn get_float_arg(matches: &ArgMatches, key: &str, min: f64, max: f64) -> Result<f64> {
    let display_key = key.replace('_', "-");
    matches
        .value_of(key)
        .ok_or_else(|| anyhow!("Bad {}", display_key))?
        .parse::<f64>()
        .map_err(|_| anyhow!("{} must be a number", display_key))
        .and_then(|value| {
            if min <= value && value <= max {
                return Ok(value);
            }
            bail!("{} must be between {} and {}", display_key, min, max)
        })
}
