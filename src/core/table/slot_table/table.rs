//! Lock-free, fixed-capacity slot table.
//!
//! [`SlotTable`] is the storage primitive underneath every bucket in the
//! space. Inserts and removals are wait-free apart from short retry loops
//! on the free ring; readers never block writers.
//!
//! # Architecture
//!
//! Two arrays of equal length back the table:
//!
//! 1. **values**: one epoch-managed pointer per slot, striped across cache
//!    lines (see [`Geometry`]).
//! 2. **free**: a ring of free abstract positions. `aid` takes positions
//!    from the ring and `fid` returns them.
//!
//! A position taken from the ring becomes the [`SlotKey`] of the new value.
//! When the value is removed, the position is returned with its serial
//! advanced by one table length, so the next occupant of the same slot
//! gets a different key.
//!
//! # Stale Keys
//!
//! Every published value carries its key. Removal and lookup compare keys
//! before touching the slot, which makes removal idempotent and keeps a
//! stale key from ever reaching a later occupant.

use crossbeam_epoch as epoch;
use crossbeam_epoch::Atomic;
use crossbeam_epoch::Guard;
use crossbeam_epoch::Owned;
use crossbeam_epoch::Shared;
use crossbeam_utils::CachePadded;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::marker::PhantomData;
use std::panic::RefUnwindSafe;
use std::panic::UnwindSafe;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::AcqRel;
use std::sync::atomic::Ordering::Acquire;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::atomic::Ordering::Release;

use crate::core::SlotKey;
use crate::core::table::slot_table::Cell;
use crate::core::table::slot_table::Geometry;
use crate::core::table::slot_table::ReadOnly;
use crate::core::table::slot_table::SlotAccessError;
use crate::core::table::slot_table::SlotIndex;
use crate::core::table::slot_table::Volatile;

const RESERVED: usize = usize::MAX;

// -----------------------------------------------------------------------------
// Permit
// -----------------------------------------------------------------------------

/// The right to claim one slot, obtained by bumping the length counter.
pub(crate) struct Permit<'table, T> {
  marker: PhantomData<&'table SlotTable<T>>,
}

// -----------------------------------------------------------------------------
// Slot Table
// -----------------------------------------------------------------------------

/// Lock-free, cache-line-aware table of `T` values addressed by [`SlotKey`].
///
/// Capacity is fixed at creation, rounded up to a power of two and clamped
/// between [`MIN_ENTRIES`] and [`MAX_ENTRIES`].
///
/// [`MIN_ENTRIES`]: Self::MIN_ENTRIES
/// [`MAX_ENTRIES`]: Self::MAX_ENTRIES
#[repr(C)]
pub(crate) struct SlotTable<T> {
  volatile: CachePadded<Volatile>,
  readonly: CachePadded<ReadOnly<T>>,
}

impl<T> SlotTable<T> {
  /// Minimum number of slots in a table.
  pub(crate) const MIN_ENTRIES: usize = Geometry::MIN_ENTRIES.get();

  /// Maximum number of slots in a table.
  pub(crate) const MAX_ENTRIES: usize = Geometry::MAX_ENTRIES.get();

  /// Default number of slots in a new table.
  pub(crate) const DEF_ENTRIES: usize = Geometry::DEF_ENTRIES.get();

  /// Creates an empty table with at least `capacity` slots.
  #[inline]
  pub(crate) fn with_capacity(capacity: usize) -> Self {
    Self {
      volatile: CachePadded::new(Volatile::new()),
      readonly: CachePadded::new(ReadOnly::new(capacity)),
    }
  }

  /// Returns the number of slots in the table.
  #[inline]
  pub(crate) fn capacity(&self) -> usize {
    self.readonly.geometry.length.get()
  }

  /// Returns the number of occupied (or about to be occupied) slots.
  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.volatile.len.load(Relaxed) as usize
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Reserves one slot, or returns `None` if the table is full.
  ///
  /// The length counter is bumped optimistically and the bump is undone
  /// if it overshot the capacity.
  #[inline]
  pub(crate) fn reserve(&self) -> Option<Permit<'_, T>> {
    let prev: u32 = self.volatile.len.fetch_add(1, Relaxed);

    if (prev as usize) < self.capacity() {
      return Some(Permit {
        marker: PhantomData,
      });
    }

    let _ignore: u32 = self.volatile.len.fetch_sub(1, Relaxed);

    None
  }

  /// Publishes the value built by `init` into the reserved slot.
  ///
  /// `init` receives the key before the value is published, so the value
  /// can record its own location. It must not panic; a panic leaks the
  /// reserved slot.
  pub(crate) fn commit<F>(&self, permit: Permit<'_, T>, init: F) -> SlotKey
  where
    F: FnOnce(SlotKey) -> T,
  {
    let key: SlotKey = SlotKey::new(self.acquire_slot(permit));
    let cell: Owned<Cell<T>> = Owned::new(Cell { key, data: init(key) });
    let slot: &Atomic<Cell<T>> = self.readonly.values.get(self.concrete(key));

    debug_assert!(
      slot.load(Relaxed, &epoch::pin()).is_null(),
      "SlotTable::commit requires that a free slot is empty",
    );

    slot.store(cell, Release);

    key
  }

  /// Removes the value published under `key`, returning `true` if this
  /// call removed it.
  ///
  /// Memory is reclaimed once no pinned reader can still observe it.
  pub(crate) fn remove(&self, key: SlotKey) -> bool {
    let slot: &Atomic<Cell<T>> = self.readonly.values.get(self.concrete(key));
    let guard: Guard = epoch::pin();
    let value: Shared<'_, Cell<T>> = slot.load(Acquire, &guard);

    // SAFETY: The guard keeps any non-null value alive.
    match unsafe { value.as_ref() } {
      Some(cell) if cell.key == key => {}
      Some(_) | None => return false,
    }

    if slot
      .compare_exchange(value, Shared::null(), AcqRel, Acquire, &guard)
      .is_err()
    {
      return false;
    }

    // SAFETY: The exchange unlinked `value`; concurrent readers are pinned.
    unsafe {
      guard.defer_destroy(value);
    }

    self.release_slot(key);

    let _ignore: u32 = self.volatile.len.fetch_sub(1, Release);

    true
  }

  /// Runs `f` against the value published under `key`.
  ///
  /// # Errors
  ///
  /// Returns [`SlotAccessError`] if `key` does not name a live value.
  pub(crate) fn with<F, R>(&self, key: SlotKey, f: F) -> Result<R, SlotAccessError>
  where
    F: FnOnce(&T) -> R,
  {
    let slot: &Atomic<Cell<T>> = self.readonly.values.get(self.concrete(key));
    let guard: Guard = epoch::pin();
    let value: Shared<'_, Cell<T>> = slot.load(Acquire, &guard);

    // SAFETY: The guard keeps any non-null value alive.
    match unsafe { value.as_ref() } {
      Some(cell) if cell.key == key => Ok(f(&cell.data)),
      Some(_) | None => Err(SlotAccessError),
    }
  }

  /// Visits every published value under a single epoch pin.
  ///
  /// Values inserted or removed during the walk may or may not be seen.
  pub(crate) fn for_each<F>(&self, mut f: F)
  where
    F: FnMut(SlotKey, &T),
  {
    let _ignore: Option<()> = self.find_map(|key, data| {
      f(key, data);
      None
    });
  }

  /// Returns the first `Some` produced by `f` while walking the table.
  pub(crate) fn find_map<F, R>(&self, mut f: F) -> Option<R>
  where
    F: FnMut(SlotKey, &T) -> Option<R>,
  {
    let guard: Guard = epoch::pin();

    for slot in self.readonly.values.as_slice() {
      let value: Shared<'_, Cell<T>> = slot.load(Acquire, &guard);

      // SAFETY: The guard keeps any non-null value alive.
      if let Some(cell) = unsafe { value.as_ref() }
        && let Some(output) = f(cell.key, &cell.data)
      {
        return Some(output);
      }
    }

    None
  }

  #[inline]
  fn concrete(&self, key: SlotKey) -> SlotIndex<'_> {
    self.readonly.geometry.to_concrete(key.into_bits())
  }

  /// Takes the next free position from the ring.
  #[inline]
  fn acquire_slot(&self, _permit: Permit<'_, T>) -> usize {
    loop {
      let position: u32 = self.volatile.aid.fetch_add(1, Relaxed);
      let index: SlotIndex<'_> = self.readonly.geometry.to_concrete(position as usize);

      let atomic: &AtomicUsize = self.readonly.free.get(index);
      let result: usize = atomic.swap(RESERVED, AcqRel);

      if result != RESERVED {
        return result;
      }
    }
  }

  /// Returns the position of `key` to the ring with its serial advanced.
  #[inline]
  fn release_slot(&self, key: SlotKey) {
    let next: usize = SlotKey::new(key.into_bits() + self.capacity()).into_bits();

    loop {
      let position: u32 = self.volatile.fid.fetch_add(1, Relaxed);
      let index: SlotIndex<'_> = self.readonly.geometry.to_concrete(position as usize);

      let atomic: &AtomicUsize = self.readonly.free.get(index);

      if atomic
        .compare_exchange(RESERVED, next, AcqRel, Relaxed)
        .is_ok()
      {
        break;
      }
    }
  }
}

impl<T> Drop for SlotTable<T> {
  fn drop(&mut self) {
    // SAFETY: `&mut self` means no other thread can reach the table.
    let guard: &Guard = unsafe { epoch::unprotected() };

    for slot in self.readonly.values.as_slice() {
      let value: Shared<'_, Cell<T>> = slot.load(Relaxed, guard);

      // SAFETY: Published values are uniquely owned by the table.
      if let Some(owned) = unsafe { value.try_into_owned() } {
        drop(owned);
      }
    }
  }
}

impl<T> Debug for SlotTable<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("SlotTable")
      .field("len", &self.volatile.len)
      .field("aid", &self.volatile.aid)
      .field("fid", &self.volatile.fid)
      .field("geometry", &self.readonly.geometry)
      .finish()
  }
}

// SAFETY: Values are only reached through shared references guarded by
// epoch pins, and are dropped on whichever thread reclaims them.
unsafe impl<T: Send + Sync> Send for SlotTable<T> {}
unsafe impl<T: Send + Sync> Sync for SlotTable<T> {}

impl<T> RefUnwindSafe for SlotTable<T> {}
impl<T> UnwindSafe for SlotTable<T> {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
