//! A `log` backend for targets whose only output is a putchar style function.

use core::fmt::{self, Write};

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::printf::{Console, FnConsole};

/// Prints `[LEVEL]: message` lines to a console function.
pub struct ConsoleLogger {
    console: FnConsole,
    level: LevelFilter,
}

impl ConsoleLogger {
    pub const fn new(putchar: fn(u8), level: LevelFilter) -> Self {
        Self {
            console: FnConsole(putchar),
            level,
        }
    }

    /// Installs `logger` as the global logger.
    pub fn init(logger: &'static ConsoleLogger) -> Result<(), SetLoggerError> {
        log::set_logger(logger).map(|()| log::set_max_level(logger.level))
    }
}

struct Adapter(FnConsole);

impl Write for Adapter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.put_all(s.as_bytes());
        Ok(())
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(
                Adapter(self.console),
                "[{}]: {}",
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
