use core::{fmt, fmt::Formatter};

use log::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A fixed pool, scratch buffer or memory block is exhausted, or an allocation failed.
    OutOfMemory(&'static str),
    /// A sink could not be opened, e.g. the output file could not be created.
    SinkOpen(&'static str),
    /// A sink rejected a byte after it was opened.
    SinkWrite(&'static str),
    /// An operation was invoked that this runtime never supports, like counter merging.
    Unsupported(&'static str),
    /// Input handed to a reader is not a valid stream or record.
    Malformed(&'static str),
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory(what) => write!(f, "Out of memory! ({})", what),
            Error::SinkOpen(sink) => write!(f, "unable to open {} sink", sink),
            Error::SinkWrite(sink) => write!(f, "failed writing to {} sink", sink),
            Error::Unsupported(op) => write!(f, "unsupported operation: {}", op),
            Error::Malformed(err) => write!(f, "malformed coverage data: {}", err),
        }
    }
}

/// What the C entry points do with an [`Error`] after reporting it.
///
/// There is no recoverable error channel towards instrumented code: a failure
/// either turns the call into a no-op or ends the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log and return without doing anything else.
    #[default]
    Return,
    /// Log and terminate the program.
    Exit,
}

impl FailurePolicy {
    /// Reports `result` if it failed and applies the policy. Returns the value on success.
    pub fn apply<T>(self, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                error!("{}", err);
                match self {
                    FailurePolicy::Return => None,
                    FailurePolicy::Exit => terminate(err),
                }
            }
        }
    }
}

#[cfg(feature = "std")]
fn terminate(_err: Error) -> ! {
    use std::io::Write;

    let _ = std::io::stdout().flush();
    std::process::exit(1)
}

#[cfg(not(feature = "std"))]
fn terminate(err: Error) -> ! {
    panic!("{}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_return_policy_swallows_error() {
        let result: Result<u32, Error> = Err(Error::OutOfMemory("registry pool"));
        assert_eq!(FailurePolicy::Return.apply(result), None);
        assert_eq!(FailurePolicy::Return.apply(Ok::<_, Error>(7)), Some(7));
    }

    #[test_log::test]
    fn test_display() {
        assert_eq!(
            Error::SinkOpen("file").to_string(),
            "unable to open file sink"
        );
    }

    #[test_log::test]
    fn test_out_of_memory_reported_once() {
        // `Runtime::register` leaves reporting to the policy, so this is the
        // only line an exhausted pool produces.
        assert_eq!(
            Error::OutOfMemory("registry pool").to_string(),
            "Out of memory! (registry pool)"
        );
    }
}
