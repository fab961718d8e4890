//! The `.gcda` wire format and the view of a coverage descriptor the serializer walks.
//!
//! Compare to `gcc/gcov-io.h`. The number of counter kinds and the unit of the
//! length fields changed between GCC releases, so they are compile-time constants
//! selected by cargo features. Tracking a new GCC release means rebuilding, not
//! reconfiguring.

use core::cell::Cell;

pub type GcovUnsigned = u32;
pub type GcovType = i64;

cfg_if::cfg_if! {
    if #[cfg(feature = "gcc-12")] {
        /// Number of counter kinds GCC reserves merge slots for.
        pub const GCOV_COUNTERS: usize = 8;
        /// GCC 12 counts record lengths in bytes instead of words.
        pub const GCOV_UNIT_SIZE: GcovUnsigned = 4;
        /// Whether the descriptor and the record header carry a checksum word.
        pub const GCOV_HAS_CHECKSUM: bool = true;
    } else if #[cfg(feature = "gcc-4-9")] {
        pub const GCOV_COUNTERS: usize = 9;
        pub const GCOV_UNIT_SIZE: GcovUnsigned = 1;
        pub const GCOV_HAS_CHECKSUM: bool = false;
    } else {
        pub const GCOV_COUNTERS: usize = 8;
        pub const GCOV_UNIT_SIZE: GcovUnsigned = 1;
        pub const GCOV_HAS_CHECKSUM: bool = false;
    }
}

pub const GCOV_DATA_MAGIC: GcovUnsigned = 0x6763_6461;
pub const GCOV_TAG_FUNCTION: GcovUnsigned = 0x0100_0000;
pub const GCOV_TAG_FUNCTION_LENGTH: GcovUnsigned = 3;
pub const GCOV_TAG_COUNTER_BASE: GcovUnsigned = 0x01a1_0000;

/// Number of header words preceding the first function block.
pub const GCOV_HEADER_WORDS: usize = if GCOV_HAS_CHECKSUM { 4 } else { 3 };

/// Tag of the counter block holding counters of `kind`.
pub const fn tag_for_counter(kind: usize) -> GcovUnsigned {
    GCOV_TAG_COUNTER_BASE + ((kind as GcovUnsigned) << 17)
}

/// Length field of a counter block with `num` 64-bit counters.
pub const fn tag_counter_length(num: usize) -> GcovUnsigned {
    (num as GcovUnsigned) * 2 * GCOV_UNIT_SIZE
}

/// Length field of a function block.
pub const fn tag_function_length() -> GcovUnsigned {
    GCOV_TAG_FUNCTION_LENGTH * GCOV_UNIT_SIZE
}

/// Inverse of [`tag_for_counter`], `None` if `tag` is no counter tag of this format.
pub fn counter_kind_of(tag: GcovUnsigned) -> Option<usize> {
    if tag < GCOV_TAG_COUNTER_BASE || (tag - GCOV_TAG_COUNTER_BASE) & 0x1ffff != 0 {
        return None;
    }

    let kind = ((tag - GCOV_TAG_COUNTER_BASE) >> 17) as usize;
    (kind < GCOV_COUNTERS).then_some(kind)
}

/// The identifying words of one instrumented function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionIdent {
    pub ident: GcovUnsigned,
    pub lineno_checksum: GcovUnsigned,
    pub cfg_checksum: GcovUnsigned,
}

/// Receives the function/counter tree of a [`CoverageData`] in order.
pub trait Visitor {
    fn function(&mut self, function: &FunctionIdent);

    /// Called once per active counter kind of the function last passed to
    /// [`Visitor::function`], in ascending `kind` order.
    fn counters(&mut self, kind: usize, values: &[Cell<GcovType>]);
}

/// Capability interface of a coverage descriptor.
///
/// Implementors are borrowed views of toolchain-owned data: nothing in this crate
/// takes ownership of a descriptor or frees it. Counters are exposed as cells since
/// instrumented code updates them in place.
pub trait CoverageData {
    /// The `.gcda` path the compiler recorded for this unit, without trailing NUL.
    fn filename(&self) -> &[u8];

    fn version(&self) -> GcovUnsigned;

    fn stamp(&self) -> GcovUnsigned;

    fn checksum(&self) -> GcovUnsigned {
        0
    }

    /// Walks every function, and for each function every active counter kind.
    fn walk(&self, visitor: &mut dyn Visitor);
}
