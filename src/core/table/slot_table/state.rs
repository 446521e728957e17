use crossbeam_epoch::Atomic;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::AtomicUsize;

use crate::core::SlotKey;
use crate::core::table::slot_table::Geometry;
use crate::core::table::slot_table::SlotArray;

/// A stored value together with the key it was published under.
pub(crate) struct Cell<T> {
  pub(crate) key: SlotKey,
  pub(crate) data: T,
}

/// Table data fixed at construction.
pub(crate) struct ReadOnly<T> {
  /// Published values, in concrete order.
  pub(crate) values: SlotArray<Atomic<Cell<T>>>,
  /// Ring of free abstract positions, in concrete order.
  pub(crate) free: SlotArray<AtomicUsize>,
  pub(crate) geometry: Geometry,
}

impl<T> ReadOnly<T> {
  pub(crate) fn new(capacity: usize) -> Self {
    let geometry: Geometry = Geometry::new(capacity);

    Self {
      values: SlotArray::from_fn(geometry.length, |_| Atomic::null()),
      free: SlotArray::from_fn(geometry.length, |index| {
        AtomicUsize::new(geometry.initial_position(index))
      }),
      geometry,
    }
  }
}

/// Counters mutated on every insert and remove.
pub(crate) struct Volatile {
  /// Number of reserved or occupied slots.
  pub(crate) len: AtomicU32,
  /// Ring cursor for the next free position to take.
  pub(crate) aid: AtomicU32,
  /// Ring cursor for the next free position to return.
  pub(crate) fid: AtomicU32,
}

impl Volatile {
  #[inline]
  pub(crate) const fn new() -> Self {
    Self {
      len: AtomicU32::new(0),
      aid: AtomicU32::new(0),
      fid: AtomicU32::new(0),
    }
  }
}
