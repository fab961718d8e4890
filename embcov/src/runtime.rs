//! The state behind the C entry points, as an explicit value.

use log::{error, info};

use crate::{
    convert::display_name,
    emit,
    error::{Error, FailurePolicy},
    gcov::{CoverageData, GcovType},
    registry::{EntryPool, Registry},
    scratch::Scratch,
    sink::Sink,
};

/// A registry, the scratch buffer records are serialized into and the policy
/// applied when something fails.
///
/// Tests create as many independent runtimes as they like; `embcov-ffi` keeps a
/// single one for the process.
pub struct Runtime<'a, P, S> {
    registry: Registry<'a, P>,
    scratch: S,
    policy: FailurePolicy,
}

impl<'a, P: EntryPool<'a>, S: Scratch> Runtime<'a, P, S> {
    pub const fn new(pool: P, scratch: S, policy: FailurePolicy) -> Self {
        Self {
            registry: Registry::new(pool),
            scratch,
            policy,
        }
    }

    pub fn registry(&self) -> &Registry<'a, P> {
        &self.registry
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn register(&mut self, info: &'a dyn CoverageData) -> Result<(), Error> {
        info!(
            "__gcov_init called for {}",
            core::str::from_utf8(display_name(info)).unwrap_or("<non-utf8>")
        );
        self.registry.register(info)
    }

    /// Forgets every registered descriptor, e.g. before startup code runs again.
    pub fn reset(&mut self) {
        self.registry.reset();
    }

    pub fn emit_all(&mut self, sinks: &mut [&mut dyn Sink]) -> Result<usize, Error> {
        emit::emit_all(&self.registry, &mut self.scratch, sinks)
    }

    pub fn clear_all(&self) {
        emit::clear_all(&self.registry);
    }

    /// Counter merging across runs is not supported, GCC must never call this.
    pub fn merge_add(&self, _counters: *mut GcovType, n_counters: u32) -> Result<(), Error> {
        error!("__gcov_merge_add called with {} counters", n_counters);
        Err(Error::Unsupported("__gcov_merge_add"))
    }

    /// Applies this runtime's [`FailurePolicy`] to `result`.
    pub fn check<T>(&self, result: Result<T, Error>) -> Option<T> {
        self.policy.apply(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        registry::{FixedPool, HeapPool},
        scratch::{FixedScratch, HeapScratch},
        sink::{Envelope, MemoryBlock, END_MARKER},
        test_utils::UnitBuilder,
    };

    #[test_log::test]
    fn test_independent_runtimes() {
        let a = UnitBuilder::new("a.gcda").function(1, &[&[1]]).build();
        let b = UnitBuilder::new("b.gcda").function(1, &[&[2]]).build();

        let mut fixed = Runtime::new(
            FixedPool::<2>::new(),
            FixedScratch::<32>::new(),
            FailurePolicy::Return,
        );
        let mut heap = Runtime::new(HeapPool::new(), HeapScratch::new(), FailurePolicy::Return);

        fixed.register(a.info()).unwrap();
        heap.register(a.info()).unwrap();
        heap.register(b.info()).unwrap();

        assert_eq!(fixed.registry().len(), 1);
        assert_eq!(heap.registry().len(), 2);

        let mut block = [0u8; 256];
        let mut memory = Envelope::new(MemoryBlock::new(&mut block));
        assert_eq!(heap.emit_all(&mut [&mut memory]), Ok(2));
        assert!(memory.get_ref().written().starts_with(b"b.gcda\0"));
    }

    #[test_log::test]
    fn test_exhaustion_keeps_entries() {
        let units: Vec<_> = (0..3)
            .map(|i| UnitBuilder::new(&format!("{}.gcda", i)).build())
            .collect();
        let mut runtime = Runtime::new(
            FixedPool::<2>::new(),
            FixedScratch::<32>::new(),
            FailurePolicy::Return,
        );

        for unit in &units[..2] {
            runtime.register(unit.info()).unwrap();
        }
        let result = runtime.register(units[2].info());
        assert_eq!(runtime.check(result), None);
        assert_eq!(runtime.registry().len(), 2);
    }

    #[test_log::test]
    fn test_reset_then_emit() {
        let a = UnitBuilder::new("a.gcda").function(1, &[&[1]]).build();
        let mut runtime = Runtime::new(
            FixedPool::<2>::new(),
            FixedScratch::<32>::new(),
            FailurePolicy::Return,
        );
        runtime.register(a.info()).unwrap();
        runtime.reset();

        let mut block = [0u8; 64];
        let mut memory = Envelope::new(MemoryBlock::new(&mut block));
        assert_eq!(runtime.emit_all(&mut [&mut memory]), Ok(0));
        assert_eq!(memory.get_ref().written(), END_MARKER);
        assert_eq!(a.counters(0, 0)[0].get(), 1);
    }

    #[test_log::test]
    fn test_merge_is_unsupported() {
        let runtime = Runtime::new(
            FixedPool::<1>::new(),
            FixedScratch::<1>::new(),
            FailurePolicy::Return,
        );

        assert_eq!(
            runtime.merge_add(core::ptr::null_mut(), 4),
            Err(Error::Unsupported("__gcov_merge_add"))
        );
    }
}
