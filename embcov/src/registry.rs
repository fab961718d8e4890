//! The list of descriptors registered by instrumented units.
//!
//! Entries live in an [`EntryPool`] and are linked newest first. They are never
//! removed one by one; [`Registry::reset`] drops the whole list at once, which is
//! needed when startup code runs again without a real restart.

use core::fmt::{Debug, Formatter};

use log::trace;

use crate::{convert::display_name, error::Error, gcov::CoverageData};

/// Index of an entry inside its pool.
pub type EntryId = usize;

#[derive(Clone, Copy)]
pub struct Entry<'a> {
    info: &'a dyn CoverageData,
    next: Option<EntryId>,
}

impl<'a> Entry<'a> {
    pub fn info(&self) -> &'a dyn CoverageData {
        self.info
    }
}

/// Storage for registry entries.
pub trait EntryPool<'a> {
    /// Stores `entry`, fails with [`Error::OutOfMemory`] when no slot is left.
    fn allocate(&mut self, entry: Entry<'a>) -> Result<EntryId, Error>;

    fn get(&self, id: EntryId) -> Option<&Entry<'a>>;

    /// Forgets every entry and makes the whole capacity available again.
    fn clear(&mut self);

    /// Number of entries the pool can ever hold, `None` if only bounded by memory.
    fn capacity(&self) -> Option<usize>;
}

/// Arena of `N` slots handed out by a cursor that only moves forward until cleared.
pub struct FixedPool<'a, const N: usize> {
    slots: [Option<Entry<'a>>; N],
    cursor: usize,
}

impl<'a, const N: usize> FixedPool<'a, N> {
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            cursor: 0,
        }
    }
}

impl<const N: usize> Default for FixedPool<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> EntryPool<'a> for FixedPool<'a, N> {
    fn allocate(&mut self, entry: Entry<'a>) -> Result<EntryId, Error> {
        let id = self.cursor;
        let slot = self
            .slots
            .get_mut(id)
            .ok_or(Error::OutOfMemory("registry pool"))?;
        *slot = Some(entry);
        self.cursor += 1;
        Ok(id)
    }

    fn get(&self, id: EntryId) -> Option<&Entry<'a>> {
        self.slots.get(id)?.as_ref()
    }

    fn clear(&mut self) {
        self.cursor = 0;
    }

    fn capacity(&self) -> Option<usize> {
        Some(N)
    }
}

/// Entries on the heap, growing with fallible reservations.
#[cfg(feature = "alloc")]
#[derive(Default)]
pub struct HeapPool<'a> {
    slots: alloc::vec::Vec<Entry<'a>>,
}

#[cfg(feature = "alloc")]
impl<'a> HeapPool<'a> {
    pub const fn new() -> Self {
        Self {
            slots: alloc::vec::Vec::new(),
        }
    }
}

#[cfg(feature = "alloc")]
impl<'a> EntryPool<'a> for HeapPool<'a> {
    fn allocate(&mut self, entry: Entry<'a>) -> Result<EntryId, Error> {
        self.slots
            .try_reserve(1)
            .map_err(|_| Error::OutOfMemory("registry heap"))?;
        self.slots.push(entry);
        Ok(self.slots.len() - 1)
    }

    fn get(&self, id: EntryId) -> Option<&Entry<'a>> {
        self.slots.get(id)
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}

pub struct Registry<'a, P> {
    pool: P,
    head: Option<EntryId>,
    len: usize,
    _marker: core::marker::PhantomData<&'a ()>,
}

impl<'a, P: EntryPool<'a>> Registry<'a, P> {
    pub const fn new(pool: P) -> Self {
        Self {
            pool,
            head: None,
            len: 0,
            _marker: core::marker::PhantomData,
        }
    }

    /// Links `info` at the head of the list.
    ///
    /// On exhaustion nothing changes and [`Error::OutOfMemory`] is returned.
    pub fn register(&mut self, info: &'a dyn CoverageData) -> Result<(), Error> {
        let id = self.pool.allocate(Entry {
            info,
            next: self.head,
        })?;
        self.head = Some(id);
        self.len += 1;

        trace!(
            "registered {} as entry {}",
            core::str::from_utf8(display_name(info)).unwrap_or("<non-utf8>"),
            id
        );
        Ok(())
    }

    /// Empties the list. Counters of the dropped descriptors are left untouched.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.head = None;
        self.len = 0;
    }

    /// Registered descriptors, most recently registered first.
    pub fn iter(&self) -> Iter<'_, 'a, P> {
        Iter {
            pool: &self.pool,
            next: self.head,
            _marker: core::marker::PhantomData,
        }
    }

    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&'a dyn CoverageData),
    {
        self.iter().for_each(f)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.pool.capacity()
    }
}

impl<'a, P: EntryPool<'a> + Default> Default for Registry<'a, P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<'a, P: EntryPool<'a>> Debug for Registry<'a, P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("Registry(")?;
        f.debug_list()
            .entries(
                self.iter()
                    .map(|info| core::str::from_utf8(display_name(info)).unwrap_or("<non-utf8>")),
            )
            .finish()?;
        f.write_str(")")?;
        Ok(())
    }
}

pub struct Iter<'r, 'a, P> {
    pool: &'r P,
    next: Option<EntryId>,
    _marker: core::marker::PhantomData<&'a ()>,
}

impl<'r, 'a, P: EntryPool<'a>> Iterator for Iter<'r, 'a, P> {
    type Item = &'a dyn CoverageData;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.pool.get(self.next?)?;
        self.next = entry.next;
        Some(entry.info)
    }
}
