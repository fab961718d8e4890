//! Destinations of serialized records.
//!
//! The emission driver talks to a list of [`Sink`]s. Binary transports only
//! need to implement the byte level [`ByteSink`] and get wrapped into an
//! [`Envelope`], which adds the stream framing every reader of these streams expects.

use crate::error::Error;

mod envelope;
#[cfg(feature = "std")]
mod file;
mod hexdump;
mod memory;
mod status;

pub use envelope::{ByteSink, Envelope};
#[cfg(feature = "std")]
pub use file::FileSink;
pub use hexdump::HexDump;
pub use memory::MemoryBlock;
pub use status::Status;

/// Terminates a binary output stream.
pub const END_MARKER: &[u8; 9] = b"Gcov End\0";

pub trait Sink {
    /// Prepares the sink for a new stream. Called once per emission.
    fn begin(&mut self) -> Result<(), Error>;

    /// Takes the record of the descriptor called `name`.
    fn record(&mut self, name: &[u8], record: &[u8]) -> Result<(), Error>;

    /// Finishes the stream after the last record.
    fn end(&mut self) -> Result<(), Error>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn begin(&mut self) -> Result<(), Error> {
        (**self).begin()
    }

    fn record(&mut self, name: &[u8], record: &[u8]) -> Result<(), Error> {
        (**self).record(name, record)
    }

    fn end(&mut self) -> Result<(), Error> {
        (**self).end()
    }
}
