//! Converts a coverage descriptor into a `.gcda` record.
//!
//! The conversion runs in two passes over the same walk: with no buffer it only
//! counts ([`compute_size`]), with a buffer it stores ([`fill`]). Callers allocate
//! exactly once in between, which is what lets the runtime work without a heap.

use core::{cell::Cell, slice};

use crate::gcov::{
    tag_counter_length, tag_for_counter, tag_function_length, CoverageData, FunctionIdent,
    GcovType, GcovUnsigned, Visitor, GCOV_DATA_MAGIC, GCOV_HAS_CHECKSUM, GCOV_TAG_FUNCTION,
};

const WORD: usize = core::mem::size_of::<GcovUnsigned>();

struct GcdaWriter<'b> {
    buffer: Option<&'b mut [GcovUnsigned]>,
    pos: usize,
}

impl GcdaWriter<'_> {
    fn store_u32(&mut self, value: GcovUnsigned) {
        if let Some(buffer) = self.buffer.as_deref_mut() {
            match buffer.get_mut(self.pos) {
                Some(word) => *word = value,
                None => panic!(
                    "gcda record overruns its buffer of {} bytes",
                    buffer.len() * WORD
                ),
            }
        }
        self.pos += 1;
    }

    fn store_u64(&mut self, value: GcovType) {
        let value = value as u64;
        self.store_u32((value & 0xffff_ffff) as GcovUnsigned);
        self.store_u32((value >> 32) as GcovUnsigned);
    }
}

impl Visitor for GcdaWriter<'_> {
    fn function(&mut self, function: &FunctionIdent) {
        self.store_u32(GCOV_TAG_FUNCTION);
        self.store_u32(tag_function_length());
        self.store_u32(function.ident);
        self.store_u32(function.lineno_checksum);
        self.store_u32(function.cfg_checksum);
    }

    fn counters(&mut self, kind: usize, values: &[Cell<GcovType>]) {
        self.store_u32(tag_for_counter(kind));
        self.store_u32(tag_counter_length(values.len()));
        for value in values {
            self.store_u64(value.get());
        }
    }
}

/// Converts `info` into `.gcda` format, returns the record length in bytes.
///
/// With `buffer` set to `None` nothing is stored and only the length is computed.
///
/// # Panics
///
/// If `buffer` is too short for the record.
pub fn convert_to_gcda(buffer: Option<&mut [GcovUnsigned]>, info: &dyn CoverageData) -> usize {
    let mut writer = GcdaWriter { buffer, pos: 0 };

    writer.store_u32(GCOV_DATA_MAGIC);
    writer.store_u32(info.version());
    writer.store_u32(info.stamp());
    if GCOV_HAS_CHECKSUM {
        writer.store_u32(info.checksum());
    }

    info.walk(&mut writer);

    writer.pos * WORD
}

/// Exact byte length of the record of `info` in its current state.
pub fn compute_size(info: &dyn CoverageData) -> usize {
    convert_to_gcda(None, info)
}

/// Writes the record of `info` into `buffer`, returns the bytes written.
///
/// Exactly [`compute_size`] bytes are written as long as no counter changes in
/// between; words past that length are left alone.
///
/// # Panics
///
/// If `buffer` holds fewer than [`compute_size`] bytes.
pub fn fill(buffer: &mut [GcovUnsigned], info: &dyn CoverageData) -> usize {
    convert_to_gcda(Some(buffer), info)
}

/// Source identifier of `info`, used for envelopes and diagnostics.
pub fn display_name(info: &dyn CoverageData) -> &[u8] {
    info.filename()
}

struct CounterReset;

impl Visitor for CounterReset {
    fn function(&mut self, _function: &FunctionIdent) {}

    fn counters(&mut self, _kind: usize, values: &[Cell<GcovType>]) {
        for value in values {
            value.set(0);
        }
    }
}

/// Sets every counter of every function of `info` to zero.
pub fn clear_counters(info: &dyn CoverageData) {
    info.walk(&mut CounterReset);
}

/// Host-native byte layout of a filled record buffer.
pub fn as_native_bytes(words: &[GcovUnsigned]) -> &[u8] {
    // SAFETY: u32 has no padding and u8 has alignment 1.
    unsafe { slice::from_raw_parts(words.as_ptr().cast::<u8>(), words.len() * WORD) }
}
