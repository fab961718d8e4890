//! gcov runtime for targets without an operating system.
//!
//! GCC instruments every translation unit compiled with `-fprofile-arcs` with
//! counter arrays and a constructor that hands a [`gcc::GcovInfo`] descriptor to
//! `__gcov_init`. This crate keeps those descriptors in a [`registry::Registry`]
//! that never needs the heap and serializes them into the `.gcda` format read by
//! `gcov`, `lcov` and friends using a two-pass protocol: [`convert::compute_size`]
//! measures a record, [`convert::fill`] writes it into an exactly sized buffer.
//!
//! The records are routed by [`emit::emit_all`] to any number of
//! [`sink::Sink`]s: a file, a fixed memory block or a hex dump on a console.
//! The C entry points themselves live in the `embcov-ffi` crate.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod codec;
pub mod config;
pub mod convert;
pub mod emit;
pub mod error;
pub mod gcc;
pub mod gcov;
pub mod logger;
pub mod printf;
pub mod record;
pub mod registry;
pub mod runtime;
pub mod scratch;
pub mod sink;
pub mod stream;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{Error, FailurePolicy};
pub use gcov::{CoverageData, FunctionIdent, GcovType, GcovUnsigned, Visitor};
pub use runtime::Runtime;
