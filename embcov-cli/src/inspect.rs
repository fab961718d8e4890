use std::io::Write;

use embcov::{
    codec::Endianness,
    record::{Item, RecordReader},
    stream::StreamReader,
};
use itertools::Itertools;

/// The version word read as text, GCC stores e.g. `B11*` for gcc 11.
fn version_text(version: u32) -> String {
    version
        .to_be_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
        .collect()
}

fn print_record<W: Write>(
    out: &mut W,
    name: &str,
    record: &[u8],
    endianness: Option<Endianness>,
) -> Result<(), Box<dyn std::error::Error>> {
    let endianness = endianness
        .or_else(|| RecordReader::detect(record))
        .unwrap_or(Endianness::NATIVE);
    let reader = RecordReader::new(record, endianness)?;
    let header = *reader.header();

    writeln!(out, "{}: {} bytes", name, record.len())?;
    write!(
        out,
        "  version {:08x} ({}) stamp {:08x}",
        header.version,
        version_text(header.version),
        header.stamp
    )?;
    if let Some(checksum) = header.checksum {
        write!(out, " checksum {:08x}", checksum)?;
    }
    writeln!(out)?;

    for item in reader {
        match item? {
            Item::Function(function) => writeln!(
                out,
                "  function {:#x} lineno_checksum {:08x} cfg_checksum {:08x}",
                function.ident, function.lineno_checksum, function.cfg_checksum
            )?,
            Item::Counters { kind, values } => writeln!(
                out,
                "    counters[{}] ({}): {}",
                kind,
                values.len(),
                values.iter().join(", ")
            )?,
        }
    }
    Ok(())
}

/// Describes an output stream, or a single `.gcda` record, on `out`.
///
/// Without `endianness` the byte order of each record is guessed from its magic.
pub fn inspect<W: Write>(
    input: &[u8],
    endianness: Option<Endianness>,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    if RecordReader::detect(input).is_some() {
        return print_record(out, "<record>", input, endianness);
    }

    let mut count = 0;
    for entry in StreamReader::new(input) {
        let entry = entry?;
        print_record(out, &String::from_utf8_lossy(entry.name), entry.record, endianness)?;
        count += 1;
    }
    writeln!(out, "{} records", count)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use embcov::{
        convert::{as_native_bytes, compute_size, fill},
        sink::{Envelope, MemoryBlock, Sink},
        test_utils::UnitBuilder,
    };

    use super::*;

    fn record_of(unit: &embcov::test_utils::TestUnit) -> Vec<u8> {
        let mut words = vec![0; compute_size(unit.info()) / 4];
        fill(&mut words, unit.info());
        as_native_bytes(&words).to_vec()
    }

    #[test_log::test]
    fn test_inspect_stream() {
        let unit = UnitBuilder::new("main.gcda")
            .stamp(0xabcd)
            .function(0x10, &[&[1, 0, 5]])
            .build();
        let record = record_of(&unit);

        let mut block = vec![0u8; 512];
        let mut sink = Envelope::new(MemoryBlock::new(&mut block));
        sink.begin().unwrap();
        sink.record(b"main.gcda", &record).unwrap();
        sink.end().unwrap();
        let stream = sink.get_ref().written().to_vec();

        let mut out = Vec::new();
        inspect(&stream, None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with(&format!("main.gcda: {} bytes\n", record.len())));
        assert!(text.contains("(B11*) stamp 0000abcd"));
        assert!(text.contains("  function 0x10 "));
        assert!(text.contains("    counters[0] (3): 1, 0, 5\n"));
        assert!(text.ends_with("1 records\n"));
    }

    #[test_log::test]
    fn test_inspect_single_record() {
        let unit = UnitBuilder::new("x.gcda").function(1, &[&[42]]).build();

        let mut out = Vec::new();
        inspect(&record_of(&unit), None, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<record>: "));
        assert!(text.contains("counters[0] (1): 42"));
    }

    #[test_log::test]
    fn test_wrong_endianness_is_reported() {
        let unit = UnitBuilder::new("x.gcda").build();
        let record = record_of(&unit);
        let wrong = if Endianness::NATIVE == Endianness::Little {
            Endianness::Big
        } else {
            Endianness::Little
        };

        let mut out = Vec::new();
        assert!(inspect(&record, Some(wrong), &mut out).is_err());
    }
}
