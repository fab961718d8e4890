use crate::{
    cprintf,
    error::Error,
    printf::Console,
    sink::Sink,
};

/// Renders records as text for a serial console.
///
/// ```text
/// Emitting 44 bytes for main.gcda
/// 00000000: 61 64 63 67 2a 31 31 42 78 56 34 12 00 00 00 01
/// ...
/// main.gcda
/// ```
pub struct HexDump<C> {
    console: C,
}

impl<C: Console> HexDump<C> {
    pub fn new(console: C) -> Self {
        Self { console }
    }

    pub fn into_inner(self) -> C {
        self.console
    }
}

impl<C: Console> Sink for HexDump<C> {
    fn begin(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn record(&mut self, name: &[u8], record: &[u8]) -> Result<(), Error> {
        cprintf!(self.console, "Emitting %d bytes for %s\n", record.len(), name);
        for (i, byte) in record.iter().enumerate() {
            if i % 16 == 0 {
                cprintf!(self.console, "%08x: ", i);
            }
            cprintf!(self.console, "%02x ", *byte as u32);
            if i % 16 == 15 {
                self.console.put(b'\n');
            }
        }
        cprintf!(self.console, "\n%s\n", name);
        Ok(())
    }

    fn end(&mut self) -> Result<(), Error> {
        self.console.put_all(b"Gcov End\n");
        Ok(())
    }
}
