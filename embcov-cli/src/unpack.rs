use std::path::{Path, PathBuf};

use embcov::stream::StreamReader;
use log::debug;

use crate::output::write_record;

/// Writes every record of a binary output stream to its own file.
pub fn unpack(
    stream: &[u8],
    out_dir: &Path,
    strip: Option<&str>,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut written = Vec::new();
    for entry in StreamReader::new(stream) {
        let entry = entry?;
        let name = String::from_utf8_lossy(entry.name);
        debug!("{}: {} bytes", name, entry.record.len());
        written.push(write_record(out_dir, &name, entry.record, strip)?);
    }
    Ok(written)
}
