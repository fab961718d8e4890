//! Recovers records from a console log of the hex dump sink.
//!
//! The log may contain anything else around the dumps; only the lines between
//! `Emitting <n> bytes for <name>` and the repeated name are read, up to `Gcov End`.

use std::path::{Path, PathBuf};

use embcov::Error;
use itertools::Itertools;
use log::{trace, warn};

use crate::output::write_record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpedUnit {
    pub name: String,
    pub record: Vec<u8>,
}

fn parse_announcement(line: &str) -> Option<(usize, &str)> {
    let (size, name) = line
        .trim()
        .strip_prefix("Emitting ")?
        .split_once(" bytes for ")?;
    Some((size.parse().ok()?, name))
}

/// Parses every dumped record of `log`.
pub fn parse_hexdump(log: &str) -> Result<Vec<DumpedUnit>, Error> {
    let mut lines = log.lines().map(|line| line.trim_end_matches('\r'));
    let mut units = Vec::new();

    while let Some(line) = lines.next() {
        if line.trim() == "Gcov End" {
            return Ok(units);
        }
        let Some((size, name)) = parse_announcement(line) else {
            trace!("skipping {:?}", line);
            continue;
        };

        let mut digits = String::with_capacity(size * 2);
        let mut offset = 0;
        while offset < size {
            let line = lines
                .next()
                .ok_or(Error::Malformed("hex dump ends inside a record"))?;
            let (address, data) = line
                .split_once(": ")
                .ok_or(Error::Malformed("expected a hex dump line"))?;
            let address = usize::from_str_radix(address.trim(), 16)
                .map_err(|_| Error::Malformed("bad hex dump offset"))?;
            if address != offset {
                return Err(Error::Malformed("hex dump offsets out of sequence"));
            }

            let bytes = data.split_whitespace().collect_vec();
            offset += bytes.len();
            digits.push_str(&bytes.iter().join(""));
        }
        if offset != size {
            return Err(Error::Malformed("hex dump longer than announced"));
        }
        let record = hex::decode(&digits).map_err(|_| Error::Malformed("bad hex byte"))?;

        match lines.by_ref().find(|line| !line.trim().is_empty()) {
            Some(trailer) if trailer.trim() == name => {}
            trailer => warn!("dump of {} followed by {:?} instead of its name", name, trailer),
        }

        units.push(DumpedUnit {
            name: name.to_string(),
            record,
        });
    }

    Err(Error::Malformed("hex dump ends without end marker"))
}

/// Writes every record of a captured console log to its own file.
pub fn unhex(
    log: &str,
    out_dir: &Path,
    strip: Option<&str>,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    parse_hexdump(log)?
        .iter()
        .map(|unit| write_record(out_dir, &unit.name, &unit.record, strip))
        .collect()
}
