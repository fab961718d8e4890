use log::debug;

use crate::{error::Error, sink::ByteSink};

/// Writes the stream into a fixed region of memory, typically one a debugger
/// dumps after the run.
///
/// Every [`ByteSink::open`] starts over at the beginning of the block.
pub struct MemoryBlock<'m> {
    block: &'m mut [u8],
    index: usize,
}

impl<'m> MemoryBlock<'m> {
    pub fn new(block: &'m mut [u8]) -> Self {
        Self { block, index: 0 }
    }

    /// Uses `len` bytes starting at `base` as output block.
    ///
    /// # Safety
    ///
    /// The region must be valid for writes, properly mapped and not used by
    /// anything else for as long as the sink exists.
    pub unsafe fn from_raw_parts(base: *mut u8, len: usize) -> MemoryBlock<'static> {
        MemoryBlock {
            block: core::slice::from_raw_parts_mut(base, len),
            index: 0,
        }
    }

    /// The bytes written since the last open.
    pub fn written(&self) -> &[u8] {
        &self.block[..self.index]
    }

    pub fn capacity(&self) -> usize {
        self.block.len()
    }
}

impl ByteSink for MemoryBlock<'_> {
    fn open(&mut self) -> Result<(), Error> {
        debug!(
            "memory sink at {:p}, {} bytes",
            self.block.as_ptr(),
            self.block.len()
        );
        self.index = 0;
        Ok(())
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), Error> {
        let slot = self
            .block
            .get_mut(self.index)
            .ok_or(Error::OutOfMemory("memory block"))?;
        *slot = byte;
        self.index += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        debug!("memory sink holds {} bytes", self.index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Envelope, Sink};

    #[test_log::test]
    fn test_envelope_layout() {
        let mut block = [0xffu8; 64];
        let mut sink = Envelope::new(MemoryBlock::new(&mut block));

        sink.begin().unwrap();
        sink.record(b"a.gcda", &[1, 2, 3, 4]).unwrap();
        sink.end().unwrap();

        let written = sink.get_ref().written();
        assert_eq!(&written[..7], b"a.gcda\0");
        assert_eq!(&written[7..11], &[0, 0, 0, 4]);
        assert_eq!(&written[11..15], &[1, 2, 3, 4]);
        assert_eq!(&written[15..], b"Gcov End\0");
    }

    #[test_log::test]
    fn test_open_restarts() {
        let mut block = [0u8; 32];
        let mut sink = Envelope::new(MemoryBlock::new(&mut block));

        for _ in 0..2 {
            sink.begin().unwrap();
            sink.end().unwrap();
            assert_eq!(sink.get_ref().written(), b"Gcov End\0");
        }
    }

    #[test_log::test]
    fn test_overflow() {
        let mut block = [0u8; 8];
        let mut sink = Envelope::new(MemoryBlock::new(&mut block));

        sink.begin().unwrap();
        assert_eq!(sink.end(), Err(Error::OutOfMemory("memory block")));
        assert_eq!(sink.get_ref().written().len(), 8);
    }
}
