//! Builds descriptors in the exact memory layout GCC emits, so tests exercise the
//! same walk instrumented firmware goes through. Everything is leaked, like the
//! static data of a real instrumented unit.

use std::{cell::Cell, ffi::CString, ptr};

use crate::gcc::{GcovCtrInfo, GcovFnInfo, GcovInfo};
use crate::gcov::{GcovType, GcovUnsigned, GCOV_COUNTERS};

/// gcc 11 version word ("B11*").
pub const TEST_VERSION: GcovUnsigned = 0x4231_312a;

/// Stand-in for GCC's `__gcov_merge_add`, only its presence matters.
pub unsafe extern "C" fn merge_add_stub(_counters: *mut GcovType, _n_counters: GcovUnsigned) {}

#[repr(C)]
struct FnBlock {
    head: GcovFnInfo,
    ctrs: [GcovCtrInfo; GCOV_COUNTERS],
}

pub struct UnitBuilder {
    filename: String,
    version: GcovUnsigned,
    stamp: GcovUnsigned,
    checksum: GcovUnsigned,
    active: Vec<usize>,
    functions: Vec<(GcovUnsigned, Vec<Vec<GcovType>>)>,
}

/// A leaked descriptor plus handles on its counters.
pub struct TestUnit {
    info: &'static GcovInfo,
    counters: Vec<Vec<&'static [Cell<GcovType>]>>,
}

impl UnitBuilder {
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_owned(),
            version: TEST_VERSION,
            stamp: 0x1234_5678,
            checksum: 0,
            active: vec![0],
            functions: Vec::new(),
        }
    }

    pub fn stamp(mut self, stamp: GcovUnsigned) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn checksum(mut self, checksum: GcovUnsigned) -> Self {
        self.checksum = checksum;
        self
    }

    /// Counter kinds with a merge function, in ascending order.
    pub fn active_kinds(mut self, kinds: &[usize]) -> Self {
        self.active = kinds.to_vec();
        self
    }

    /// Adds a function with one counter array per active kind.
    pub fn function(mut self, ident: GcovUnsigned, counters: &[&[GcovType]]) -> Self {
        assert_eq!(counters.len(), self.active.len(), "one array per active kind");
        self.functions
            .push((ident, counters.iter().map(|c| c.to_vec()).collect()));
        self
    }

    pub fn build(self) -> TestUnit {
        let filename = CString::new(self.filename).unwrap().into_raw();

        let mut merge: [Option<crate::gcc::GcovMergeFn>; GCOV_COUNTERS] = [None; GCOV_COUNTERS];
        for &kind in &self.active {
            merge[kind] = Some(merge_add_stub);
        }

        let info: &'static mut GcovInfo = Box::leak(Box::new(GcovInfo {
            version: self.version,
            next: ptr::null_mut(),
            stamp: self.stamp,
            #[cfg(feature = "gcc-12")]
            checksum: self.checksum,
            filename,
            merge,
            n_functions: self.functions.len() as GcovUnsigned,
            functions: ptr::null(),
        }));
        #[cfg(not(feature = "gcc-12"))]
        let _ = self.checksum;

        let mut counters = Vec::new();
        let mut records: Vec<*const GcovFnInfo> = Vec::new();
        for (ident, arrays) in self.functions {
            let mut handles = Vec::new();
            let block = Box::leak(Box::new(FnBlock {
                head: GcovFnInfo {
                    key: ptr::addr_of!(*info),
                    ident,
                    lineno_checksum: ident.wrapping_mul(31),
                    cfg_checksum: ident.wrapping_mul(17),
                    ctrs: [],
                },
                ctrs: std::array::from_fn(|_| GcovCtrInfo {
                    num: 0,
                    values: ptr::null_mut(),
                }),
            }));

            for (slot, values) in arrays.into_iter().enumerate() {
                let cells: &'static [Cell<GcovType>] =
                    Box::leak(values.into_iter().map(Cell::new).collect::<Box<[_]>>());
                block.ctrs[slot] = GcovCtrInfo {
                    num: cells.len() as GcovUnsigned,
                    values: cells.as_ptr() as *mut GcovType,
                };
                handles.push(cells);
            }

            records.push(block as *const FnBlock as *const GcovFnInfo);
            counters.push(handles);
        }

        info.functions = Box::leak(records.into_boxed_slice()).as_ptr();

        TestUnit { info, counters }
    }
}

impl TestUnit {
    pub fn info(&self) -> &'static GcovInfo {
        self.info
    }

    /// Counters of the `function`-th function for its `slot`-th active kind.
    pub fn counters(&self, function: usize, slot: usize) -> &'static [Cell<GcovType>] {
        self.counters[function][slot]
    }

    pub fn raw(&self) -> *mut GcovInfo {
        self.info as *const GcovInfo as *mut GcovInfo
    }
}
