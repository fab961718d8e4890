//! Buffers records are serialized into.
//!
//! Only one record is alive at a time: the driver acquires a buffer sized by the
//! measuring pass, fills it, hands it to the sinks and releases it before moving
//! on to the next descriptor.

use log::trace;

use crate::{error::Error, gcov::GcovUnsigned};

const WORD: usize = core::mem::size_of::<GcovUnsigned>();

pub trait Scratch {
    /// Returns a word buffer of exactly `bytes` rounded up to whole words.
    fn acquire(&mut self, bytes: usize) -> Result<&mut [GcovUnsigned], Error>;

    /// Gives back the buffer of the last [`Scratch::acquire`].
    fn release(&mut self);
}

/// One word array shared by every record.
pub struct FixedScratch<const WORDS: usize> {
    words: [GcovUnsigned; WORDS],
}

impl<const WORDS: usize> FixedScratch<WORDS> {
    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }
}

impl<const WORDS: usize> Default for FixedScratch<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> Scratch for FixedScratch<WORDS> {
    fn acquire(&mut self, bytes: usize) -> Result<&mut [GcovUnsigned], Error> {
        let words = (bytes + WORD - 1) / WORD;
        trace!("scratch: {} of {} words", words, WORDS);
        self.words
            .get_mut(..words)
            .ok_or(Error::OutOfMemory("scratch buffer"))
    }

    fn release(&mut self) {}
}

/// Allocates an exactly sized buffer per record.
#[cfg(feature = "alloc")]
#[derive(Default)]
pub struct HeapScratch {
    words: alloc::vec::Vec<GcovUnsigned>,
}

#[cfg(feature = "alloc")]
impl HeapScratch {
    pub const fn new() -> Self {
        Self {
            words: alloc::vec::Vec::new(),
        }
    }
}

#[cfg(feature = "alloc")]
impl Scratch for HeapScratch {
    fn acquire(&mut self, bytes: usize) -> Result<&mut [GcovUnsigned], Error> {
        let words = (bytes + WORD - 1) / WORD;
        let mut buffer = alloc::vec::Vec::new();
        buffer
            .try_reserve_exact(words)
            .map_err(|_| Error::OutOfMemory("record buffer"))?;
        buffer.resize(words, 0);
        self.words = buffer;
        Ok(self.words.as_mut_slice())
    }

    fn release(&mut self) {
        self.words = alloc::vec::Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_fixed_scratch_bounds() {
        let mut scratch = FixedScratch::<4>::new();

        assert_eq!(scratch.acquire(16).map(|b| b.len()), Ok(4));
        assert_eq!(scratch.acquire(5).map(|b| b.len()), Ok(2));
        assert_eq!(
            scratch.acquire(17).map(|b| b.len()),
            Err(Error::OutOfMemory("scratch buffer"))
        );
    }

    #[test_log::test]
    fn test_heap_scratch() {
        let mut scratch = HeapScratch::new();

        assert_eq!(scratch.acquire(12).map(|b| b.len()), Ok(3));
        scratch.release();
        assert!(scratch.words.is_empty());
    }
}
