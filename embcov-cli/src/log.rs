use std::{env, str::FromStr};

use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};

/// Logs to stderr, stdout is reserved for command output.
pub fn config_default(level: LevelFilter) -> Result<Config, Box<dyn std::error::Error>> {
    Ok(Config::builder()
        .appender(appender_stderr("stderr"))
        .build(Root::builder().appender("stderr").build(level))?)
}

fn appender_stderr<S>(name: S) -> Appender
where
    S: AsRef<str>,
{
    Appender::builder().build(
        name.as_ref(),
        Box::new(
            ConsoleAppender::builder()
                .target(Target::Stderr)
                .encoder(Box::new(PatternEncoder::new(
                    "{h({d(%Y-%m-%dT%H:%M:%S%Z)}\t{m}{n})}",
                )))
                .build(),
        ),
    )
}

/// Level from `RUST_LOG`, `Info` if unset. `verbose` raises it to at least `Debug`.
pub fn log_level(verbose: bool) -> LevelFilter {
    let level = env::var("RUST_LOG")
        .ok()
        .and_then(|level| LevelFilter::from_str(&level).ok())
        .unwrap_or(LevelFilter::Info);

    if verbose {
        level.max(LevelFilter::Debug)
    } else {
        level
    }
}
