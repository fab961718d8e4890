use crate::{cprintf, error::Error, printf::Console, sink::Sink};

/// Prints one progress line per record and a closing `Gcov End` line.
///
/// This is the console output of a hex dump without the dump itself, for
/// builds that want status messages but extract the data some other way.
pub struct Status<C> {
    console: C,
}

impl<C: Console> Status<C> {
    pub fn new(console: C) -> Self {
        Self { console }
    }

    pub fn into_inner(self) -> C {
        self.console
    }
}

impl<C: Console> Sink for Status<C> {
    fn begin(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn record(&mut self, name: &[u8], record: &[u8]) -> Result<(), Error> {
        cprintf!(self.console, "Emitting %d bytes for %s\n", record.len(), name);
        Ok(())
    }

    fn end(&mut self) -> Result<(), Error> {
        self.console.put_all(b"Gcov End\n");
        Ok(())
    }
}
