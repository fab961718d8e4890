//! In-memory layout of the descriptors GCC emits for `-fprofile-arcs`.
//!
//! These structures are defined by GCC and must stay as close to the original
//! definition as possible (compare to `libgcc/libgcov.h`). Only the fields the
//! runtime reads are public to the crate; a descriptor reference can only be made
//! from a pointer handed over by instrumented code.

use core::{cell::Cell, ffi::c_char, ffi::CStr, ptr, slice};

use crate::gcov::{
    CoverageData, FunctionIdent, GcovType, GcovUnsigned, Visitor, GCOV_COUNTERS,
};

/// Merge function GCC installs for every active counter kind.
pub type GcovMergeFn = unsafe extern "C" fn(counters: *mut GcovType, n_counters: GcovUnsigned);

/// Counters of one kind for one function.
#[repr(C)]
pub struct GcovCtrInfo {
    pub(crate) num: GcovUnsigned,
    pub(crate) values: *mut GcovType,
}

/// Function record. Followed in memory by one [`GcovCtrInfo`] per active kind.
#[repr(C)]
pub struct GcovFnInfo {
    #[allow(dead_code)]
    pub(crate) key: *const GcovInfo,
    pub(crate) ident: GcovUnsigned,
    pub(crate) lineno_checksum: GcovUnsigned,
    pub(crate) cfg_checksum: GcovUnsigned,
    pub(crate) ctrs: [GcovCtrInfo; 0],
}

/// Descriptor of one instrumented translation unit.
#[repr(C)]
pub struct GcovInfo {
    pub(crate) version: GcovUnsigned,
    #[allow(dead_code)]
    pub(crate) next: *mut GcovInfo,
    pub(crate) stamp: GcovUnsigned,
    #[cfg(feature = "gcc-12")]
    pub(crate) checksum: GcovUnsigned,
    pub(crate) filename: *const c_char,
    pub(crate) merge: [Option<GcovMergeFn>; GCOV_COUNTERS],
    pub(crate) n_functions: GcovUnsigned,
    pub(crate) functions: *const *const GcovFnInfo,
}

impl GcovInfo {
    /// Borrows the descriptor behind `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a descriptor produced by GCC for the format
    /// selected at build time, which stays valid and structurally unchanged for `'a`.
    pub unsafe fn from_ptr<'a>(ptr: *const GcovInfo) -> Option<&'a GcovInfo> {
        ptr.as_ref()
    }

    /// GCC marks a counter kind as present by installing its merge function.
    pub fn counter_active(&self, kind: usize) -> bool {
        self.merge.get(kind).map_or(false, Option::is_some)
    }

    pub fn n_functions(&self) -> usize {
        self.n_functions as usize
    }

    fn function_ptrs(&self) -> &[*const GcovFnInfo] {
        if self.functions.is_null() || self.n_functions == 0 {
            return &[];
        }
        // SAFETY: GCC emits `n_functions` valid entries, guaranteed by `from_ptr`.
        unsafe { slice::from_raw_parts(self.functions, self.n_functions as usize) }
    }
}

impl GcovCtrInfo {
    fn values(&self) -> &[Cell<GcovType>] {
        if self.values.is_null() || self.num == 0 {
            return &[];
        }
        // SAFETY: `Cell<T>` has the layout of `T`, the array holds `num` counters.
        unsafe { slice::from_raw_parts(self.values.cast::<Cell<GcovType>>(), self.num as usize) }
    }
}

impl CoverageData for GcovInfo {
    fn filename(&self) -> &[u8] {
        if self.filename.is_null() {
            return &[];
        }
        // SAFETY: GCC stores a NUL terminated path.
        unsafe { CStr::from_ptr(self.filename) }.to_bytes()
    }

    fn version(&self) -> GcovUnsigned {
        self.version
    }

    fn stamp(&self) -> GcovUnsigned {
        self.stamp
    }

    #[cfg(feature = "gcc-12")]
    fn checksum(&self) -> GcovUnsigned {
        self.checksum
    }

    fn walk(&self, visitor: &mut dyn Visitor) {
        for &fn_ptr in self.function_ptrs() {
            // SAFETY: function records are valid for the lifetime of the descriptor.
            let function = unsafe { &*fn_ptr };
            visitor.function(&FunctionIdent {
                ident: function.ident,
                lineno_checksum: function.lineno_checksum,
                cfg_checksum: function.cfg_checksum,
            });

            // SAFETY: the counter infos trail the record, one per active kind.
            let mut ctr = unsafe { ptr::addr_of!((*fn_ptr).ctrs) }.cast::<GcovCtrInfo>();
            for kind in 0..GCOV_COUNTERS {
                if !self.counter_active(kind) {
                    continue;
                }
                // SAFETY: see above, `ctr` never passes the last active kind.
                let info = unsafe { &*ctr };
                visitor.counters(kind, info.values());
                ctr = unsafe { ctr.add(1) };
            }
        }
    }
}
