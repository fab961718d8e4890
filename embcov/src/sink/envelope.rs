use crate::{codec::put_length, error::Error, sink::Sink};

use super::END_MARKER;

/// A transport that accepts one byte at a time.
pub trait ByteSink {
    fn open(&mut self) -> Result<(), Error>;

    fn put_byte(&mut self, byte: u8) -> Result<(), Error>;

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        bytes.iter().try_for_each(|&byte| self.put_byte(byte))
    }

    fn close(&mut self) -> Result<(), Error>;
}

/// Frames records for a [`ByteSink`]: `name\0`, four length bytes most
/// significant first, then the record bytes as they are laid out in memory.
/// The stream ends with `"Gcov End\0"`.
pub struct Envelope<B> {
    inner: B,
}

impl<B: ByteSink> Envelope<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &B {
        &self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: ByteSink> Sink for Envelope<B> {
    fn begin(&mut self) -> Result<(), Error> {
        self.inner.open()
    }

    fn record(&mut self, name: &[u8], record: &[u8]) -> Result<(), Error> {
        self.inner.put_bytes(name)?;
        self.inner.put_byte(0)?;
        self.inner.put_bytes(&put_length(record.len()))?;
        self.inner.put_bytes(record)
    }

    fn end(&mut self) -> Result<(), Error> {
        self.inner.put_bytes(END_MARKER)?;
        self.inner.close()
    }
}
