use std::{
    fs,
    io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{arg, crate_authors, crate_name, crate_version, value_parser, ArgMatches, Command};
use embcov::codec::Endianness;
use log::{error, info};

use crate::{inspect::inspect, log::config_default, log::log_level, unhex::unhex, unpack::unpack};

fn create_app() -> Command {
    Command::new(crate_name!())
        .version(crate::MAYBE_GIT_REF.unwrap_or(crate_version!()))
        .author(crate_authors!())
        .about("Recovers .gcda files from coverage streams of embcov targets")
        .arg(arg!(-v --verbose "Log more details"))
        .subcommand_required(true)
        .subcommands(vec![
            Command::new("unpack")
                .about("Splits a binary output stream into .gcda files")
                .arg(arg!(<stream> "The file or memory dump holding the stream")
                    .value_parser(value_parser!(PathBuf)))
                .arg(arg!(-o --output [dir] "Directory to write the .gcda files to")
                    .value_parser(value_parser!(PathBuf)))
                .arg(arg!(--strip [prefix] "Prefix removed from unit names before writing")),
            Command::new("unhex")
                .about("Recovers .gcda files from a captured hex dump console log")
                .arg(arg!(<log> "The captured console output")
                    .value_parser(value_parser!(PathBuf)))
                .arg(arg!(-o --output [dir] "Directory to write the .gcda files to")
                    .value_parser(value_parser!(PathBuf)))
                .arg(arg!(--strip [prefix] "Prefix removed from unit names before writing")),
            Command::new("inspect")
                .about("Prints the records of a stream or of a single .gcda file")
                .arg(arg!(<stream> "The stream or .gcda file")
                    .value_parser(value_parser!(PathBuf)))
                .arg(arg!(--"big-endian" "Records were written by a big endian target")),
        ])
}

pub fn main() -> ExitCode {
    let matches = create_app().get_matches();
    run(&matches)
}

pub fn run(matches: &ArgMatches) -> ExitCode {
    let level = log_level(matches.get_flag("verbose"));
    let logging = config_default(level)
        .and_then(|config| log4rs::init_config(config).map_err(Into::into));
    if let Err(err) = logging {
        eprintln!("Failed to init logging: {:?}", err);
        return ExitCode::FAILURE;
    }

    info!("Git Version: {}", crate::GIT_REF);

    let result = match matches.subcommand() {
        Some(("unpack", matches)) => unpack_command(matches),
        Some(("unhex", matches)) => unhex_command(matches),
        Some(("inspect", matches)) => inspect_command(matches),
        _ => Err("no command given".into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn output_dir(matches: &ArgMatches) -> &Path {
    matches
        .get_one::<PathBuf>("output")
        .map_or(Path::new("."), PathBuf::as_path)
}

fn unpack_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let input: &PathBuf = matches.get_one("stream").ok_or("missing stream")?;
    let strip = matches.get_one::<String>("strip").map(String::as_str);

    let stream = fs::read(input)?;
    let written = unpack(&stream, output_dir(matches), strip)?;
    info!("Unpacked {} records from {}", written.len(), input.display());
    Ok(())
}

fn unhex_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let input: &PathBuf = matches.get_one("log").ok_or("missing log")?;
    let strip = matches.get_one::<String>("strip").map(String::as_str);

    let bytes = fs::read(input)?;
    let log = String::from_utf8_lossy(&bytes);
    let written = unhex(&log, output_dir(matches), strip)?;
    info!("Recovered {} records from {}", written.len(), input.display());
    Ok(())
}

fn inspect_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let input: &PathBuf = matches.get_one("stream").ok_or("missing stream")?;
    let endianness = matches
        .get_flag("big-endian")
        .then_some(Endianness::Big);

    let bytes = fs::read(input)?;
    inspect(&bytes, endianness, &mut io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_app_is_consistent() {
        create_app().debug_assert();
    }

    #[test_log::test]
    fn test_parse_unpack() {
        let matches = create_app()
            .try_get_matches_from(["embcov", "-v", "unpack", "out.bin", "-o", "cov", "--strip", "/b/"])
            .unwrap();

        assert!(matches.get_flag("verbose"));
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "unpack");
        assert_eq!(output_dir(sub), Path::new("cov"));
        assert_eq!(sub.get_one::<String>("strip").map(String::as_str), Some("/b/"));
    }

    #[test_log::test]
    fn test_command_required() {
        assert!(create_app().try_get_matches_from(["embcov"]).is_err());
    }
}
