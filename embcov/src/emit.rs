//! Walks the registry and hands every record to every sink.

use log::{debug, info};

use crate::{
    convert::{as_native_bytes, clear_counters, compute_size, display_name, fill},
    error::Error,
    registry::{EntryPool, Registry},
    scratch::Scratch,
    sink::Sink,
};

fn printable(name: &[u8]) -> &str {
    core::str::from_utf8(name).unwrap_or("<non-utf8>")
}

/// Emits the record of every registered descriptor to every sink, then ends
/// the stream on each sink. Returns the number of records emitted.
///
/// All sinks are opened before anything is written. The first failure stops the
/// emission; what has been written so far stays. The record buffer is released
/// either way.
///
/// # Panics
///
/// If a record changes size between measuring and filling it.
pub fn emit_all<'a, P, S>(
    registry: &Registry<'a, P>,
    scratch: &mut S,
    sinks: &mut [&mut dyn Sink],
) -> Result<usize, Error>
where
    P: EntryPool<'a>,
    S: Scratch + ?Sized,
{
    for sink in sinks.iter_mut() {
        sink.begin()?;
    }

    let mut emitted = 0;
    for info in registry.iter() {
        let name = display_name(info);
        let size = compute_size(info);

        let buffer = scratch.acquire(size)?;
        let written = fill(buffer, info);
        assert_eq!(
            written,
            size,
            "record of {} changed size while being written",
            printable(name)
        );
        debug!("Emitting {} bytes for {}", size, printable(name));

        let record = &as_native_bytes(buffer)[..size];
        let result = sinks
            .iter_mut()
            .try_for_each(|sink| sink.record(name, record));
        scratch.release();
        result?;
        emitted += 1;
    }

    for sink in sinks.iter_mut() {
        sink.end()?;
    }

    info!("Emitted {} coverage records", emitted);
    Ok(emitted)
}

/// Zeroes the counters of every registered descriptor.
pub fn clear_all<'a, P: EntryPool<'a>>(registry: &Registry<'a, P>) {
    info!("Clearing counters of {} descriptors", registry.len());
    registry.for_each(clear_counters);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::{decode_length, Endianness, Reader},
        gcov::{tag_counter_length, tag_for_counter, GCOV_DATA_MAGIC, GCOV_TAG_FUNCTION},
        registry::FixedPool,
        scratch::{FixedScratch, HeapScratch},
        sink::{Envelope, HexDump, MemoryBlock, END_MARKER},
        test_utils::{TestUnit, UnitBuilder},
    };

    fn three_units() -> Vec<TestUnit> {
        [("one.gcda", 1), ("zero.gcda", 0), ("five.gcda", 5)]
            .iter()
            .map(|(name, count)| UnitBuilder::new(name).function(1, &[&[*count]]).build())
            .collect()
    }

    #[test_log::test]
    fn test_three_descriptors_to_memory() {
        let units = three_units();
        let mut registry = Registry::new(FixedPool::<8>::new());
        for unit in &units {
            registry.register(unit.info()).unwrap();
        }

        let mut block = vec![0u8; 1024];
        let mut memory = Envelope::new(MemoryBlock::new(&mut block));
        let mut scratch = FixedScratch::<64>::new();

        let emitted = emit_all(&registry, &mut scratch, &mut [&mut memory]).unwrap();
        assert_eq!(emitted, 3);
        let first = memory.get_ref().written().to_vec();

        let mut reader = Reader::init(&first);
        for (name, count) in [("five.gcda", 5u32), ("zero.gcda", 0), ("one.gcda", 1)] {
            assert_eq!(reader.take_until_nul(), Some(name.as_bytes()));
            let len = decode_length(reader.take(4).unwrap()).unwrap();
            let mut record = reader.sub(len).unwrap();

            let mut word = || record.read_u32(Endianness::NATIVE).unwrap();
            assert_eq!(word(), GCOV_DATA_MAGIC);
            let header_rest = crate::gcov::GCOV_HEADER_WORDS - 1;
            (0..header_rest).for_each(|_| {
                word();
            });
            assert_eq!(word(), GCOV_TAG_FUNCTION);
            (0..4).for_each(|_| {
                word();
            });
            assert_eq!(word(), tag_for_counter(0));
            assert_eq!(word(), tag_counter_length(1));
            assert_eq!(word(), count);
            assert_eq!(word(), 0);
            assert!(!record.any_left());
        }
        assert_eq!(reader.rest(), END_MARKER);

        emit_all(&registry, &mut scratch, &mut [&mut memory]).unwrap();
        assert_eq!(memory.get_ref().written(), &first[..]);
    }

    #[test_log::test]
    fn test_reset_emits_only_marker() {
        let units = three_units();
        let mut registry = Registry::new(FixedPool::<8>::new());
        for unit in &units {
            registry.register(unit.info()).unwrap();
        }
        registry.reset();

        let mut block = [0u8; 64];
        let mut memory = Envelope::new(MemoryBlock::new(&mut block));
        let mut hexdump = HexDump::new(Vec::new());

        let emitted = emit_all(
            &registry,
            &mut HeapScratch::new(),
            &mut [&mut memory, &mut hexdump],
        )
        .unwrap();

        assert_eq!(emitted, 0);
        assert_eq!(memory.get_ref().written(), END_MARKER);
        assert_eq!(hexdump.into_inner(), b"Gcov End\n");
    }

    /// Checks the hex dump of a single descriptor against its binary record.
    fn assert_hexdump_matches_binary(unit: &TestUnit) {
        let mut registry = Registry::new(FixedPool::<1>::new());
        registry.register(unit.info()).unwrap();

        let mut block = vec![0u8; 512];
        let mut memory = Envelope::new(MemoryBlock::new(&mut block));
        let mut hexdump = HexDump::new(Vec::new());
        emit_all(
            &registry,
            &mut FixedScratch::<128>::new(),
            &mut [&mut memory, &mut hexdump],
        )
        .unwrap();

        let name = display_name(unit.info());
        let name = core::str::from_utf8(name).unwrap();
        let size = compute_size(unit.info());
        let text = String::from_utf8(hexdump.into_inner()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(format!("Emitting {} bytes for {}", size, name).as_str())
        );

        let mut bytes = Vec::new();
        for i in 0..(size + 15) / 16 {
            let line = lines.next().unwrap();
            let (offset, data) = line.split_once(": ").unwrap();
            assert_eq!(usize::from_str_radix(offset, 16).unwrap(), i * 16);
            bytes.extend(
                data.split_whitespace()
                    .map(|byte| u8::from_str_radix(byte, 16).unwrap()),
            );
        }
        if size % 16 == 0 {
            assert_eq!(lines.next(), Some(""));
        }

        let binary = memory.get_ref().written();
        assert_eq!(&binary[name.len() + 1 + 4..][..size], &bytes[..]);
        assert_eq!(lines.next(), Some(name));
        assert_eq!(lines.next(), Some("Gcov End"));
        assert_eq!(lines.next(), None);
    }

    #[test_log::test]
    fn test_hexdump_matches_binary() {
        let units = three_units();
        assert_hexdump_matches_binary(&units[2]);
    }

    #[test_log::test]
    fn test_hexdump_matches_binary_with_partial_line() {
        // Eight more bytes than five.gcda, so at least one of the two
        // records ends mid line whatever the header size is.
        let unit = UnitBuilder::new("two.gcda").function(3, &[&[4, 9]]).build();
        let size = compute_size(unit.info());
        assert_ne!(size % 16, compute_size(three_units()[2].info()) % 16);
        assert_hexdump_matches_binary(&unit);
    }

    #[test_log::test]
    fn test_scratch_exhaustion_halts() {
        let big = UnitBuilder::new("big.gcda")
            .function(1, &[&[1; 32]])
            .build();
        let mut registry = Registry::new(FixedPool::<1>::new());
        registry.register(big.info()).unwrap();

        let mut block = [0u8; 512];
        let mut memory = Envelope::new(MemoryBlock::new(&mut block));
        let result = emit_all(&registry, &mut FixedScratch::<8>::new(), &mut [&mut memory]);

        assert_eq!(result, Err(Error::OutOfMemory("scratch buffer")));
        assert!(memory.get_ref().written().is_empty());
    }

    struct Counting {
        inner: FixedScratch<64>,
        acquired: usize,
        released: usize,
    }

    impl Scratch for Counting {
        fn acquire(&mut self, bytes: usize) -> Result<&mut [u32], Error> {
            self.acquired += 1;
            self.inner.acquire(bytes)
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    struct Rejecting;

    impl Sink for Rejecting {
        fn begin(&mut self) -> Result<(), Error> {
            Ok(())
        }

        fn record(&mut self, _name: &[u8], _record: &[u8]) -> Result<(), Error> {
            Err(Error::SinkWrite("rejecting"))
        }

        fn end(&mut self) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test_log::test]
    fn test_sink_failure_releases_scratch() {
        let units = three_units();
        let mut registry = Registry::new(FixedPool::<8>::new());
        registry.register(units[0].info()).unwrap();

        let mut scratch = Counting {
            inner: FixedScratch::new(),
            acquired: 0,
            released: 0,
        };
        let result = emit_all(&registry, &mut scratch, &mut [&mut Rejecting]);

        assert_eq!(result, Err(Error::SinkWrite("rejecting")));
        assert_eq!((scratch.acquired, scratch.released), (1, 1));
    }

    #[test_log::test]
    fn test_clear_all_is_idempotent() {
        let units = three_units();
        let mut registry = Registry::new(FixedPool::<8>::new());
        for unit in &units {
            registry.register(unit.info()).unwrap();
        }

        clear_all(&registry);
        clear_all(&registry);

        assert!(units.iter().all(|unit| unit.counters(0, 0)[0].get() == 0));
        units[0].counters(0, 0)[0].set(2);
        assert_eq!(units[0].counters(0, 0)[0].get(), 2);
    }
}
