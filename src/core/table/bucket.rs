//! Growable, non-blocking bucket built from a chain of slot tables.
//!
//! A [`Bucket`] owns up to [`BUCKET_SEGMENTS`] [`SlotTable`]s. Segment `i`
//! holds `base << i` slots and is allocated the first time every earlier
//! segment is full, so a bucket grows without ever moving a stored value
//! and without a lock on the insert or remove path.

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::OnceLock;

use crate::consts::BUCKET_SEGMENTS;
use crate::core::SlotKey;
use crate::core::table::Permit;
use crate::core::table::SlotTable;
use crate::raise;

// -----------------------------------------------------------------------------
// Bucket Key
// -----------------------------------------------------------------------------

/// Location of one value inside a [`Bucket`].
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct BucketKey {
  segment: u32,
  slot: SlotKey,
}

impl BucketKey {
  #[inline]
  pub(crate) const fn new(segment: usize, slot: SlotKey) -> Self {
    Self {
      segment: segment as u32,
      slot,
    }
  }

  #[inline]
  pub(crate) const fn segment(&self) -> usize {
    self.segment as usize
  }

  #[inline]
  pub(crate) const fn slot(&self) -> SlotKey {
    self.slot
  }
}

impl Debug for BucketKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "BucketKey({}:{:?})", self.segment, self.slot)
  }
}

impl Display for BucketKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{}{}", self.segment, self.slot)
  }
}

// -----------------------------------------------------------------------------
// Bucket
// -----------------------------------------------------------------------------

pub(crate) struct Bucket<T> {
  base: usize,
  segments: [OnceLock<Box<SlotTable<T>>>; BUCKET_SEGMENTS],
}

impl<T> Bucket<T> {
  /// Creates an empty bucket whose first segment holds `base` slots.
  ///
  /// No segment is allocated until the first insert.
  pub(crate) fn new(base: usize) -> Self {
    Self {
      base: base.clamp(SlotTable::<T>::MIN_ENTRIES, SlotTable::<T>::MAX_ENTRIES),
      segments: [const { OnceLock::new() }; BUCKET_SEGMENTS],
    }
  }

  /// Returns the number of values currently stored.
  pub(crate) fn len(&self) -> usize {
    self.tables().map(|table| table.len()).sum()
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.tables().all(|table| table.is_empty())
  }

  /// Returns the total number of slots allocated so far.
  pub(crate) fn capacity(&self) -> usize {
    self.tables().map(|table| table.capacity()).sum()
  }

  /// Inserts the value built by `init`, growing into a new segment when
  /// every allocated one is full.
  ///
  /// # Panics
  ///
  /// Raises a `SysCap` exception if every segment is full.
  pub(crate) fn insert_with<F>(&self, init: F) -> BucketKey
  where
    F: FnOnce(BucketKey) -> T,
  {
    for (segment, cell) in self.segments.iter().enumerate() {
      let table: &SlotTable<T> = cell.get_or_init(|| Box::new(SlotTable::with_capacity(self.segment_capacity(segment))));

      if table.len() >= table.capacity() {
        continue;
      }

      let Some(permit) = table.reserve() else {
        continue;
      };

      return self.publish(table, segment, permit, init);
    }

    raise!(Error, SysCap, "bucket segments exhausted");
  }

  #[inline]
  pub(crate) fn insert(&self, item: T) -> BucketKey {
    self.insert_with(|_| item)
  }

  /// Removes the value stored at `key`; `false` if it was already gone.
  pub(crate) fn remove(&self, key: BucketKey) -> bool {
    self
      .table(key)
      .is_some_and(|table| table.remove(key.slot()))
  }

  /// Runs `f` against the value stored at `key`, if still present.
  pub(crate) fn with<F, R>(&self, key: BucketKey, f: F) -> Option<R>
  where
    F: FnOnce(&T) -> R,
  {
    self.table(key)?.with(key.slot(), f).ok()
  }

  pub(crate) fn for_each<F>(&self, mut f: F)
  where
    F: FnMut(BucketKey, &T),
  {
    for (segment, table) in self.tables().enumerate() {
      table.for_each(|slot, data| f(BucketKey::new(segment, slot), data));
    }
  }

  pub(crate) fn find_map<F, R>(&self, mut f: F) -> Option<R>
  where
    F: FnMut(BucketKey, &T) -> Option<R>,
  {
    self
      .tables()
      .enumerate()
      .find_map(|(segment, table)| table.find_map(|slot, data| f(BucketKey::new(segment, slot), data)))
  }

  /// Returns the keys of every value for which `f` returns `true`.
  pub(crate) fn collect_keys<F>(&self, mut f: F) -> Vec<BucketKey>
  where
    F: FnMut(&T) -> bool,
  {
    let mut keys: Vec<BucketKey> = Vec::new();

    self.for_each(|key, data| {
      if f(data) {
        keys.push(key);
      }
    });

    keys
  }

  #[inline]
  fn publish<F>(&self, table: &SlotTable<T>, segment: usize, permit: Permit<'_, T>, init: F) -> BucketKey
  where
    F: FnOnce(BucketKey) -> T,
  {
    let slot: SlotKey = table.commit(permit, |slot| init(BucketKey::new(segment, slot)));
    BucketKey::new(segment, slot)
  }

  #[inline]
  fn table(&self, key: BucketKey) -> Option<&SlotTable<T>> {
    self.segments.get(key.segment())?.get().map(Box::as_ref)
  }

  /// Allocated segments, in order.
  #[inline]
  fn tables(&self) -> impl Iterator<Item = &SlotTable<T>> {
    self
      .segments
      .iter()
      .map_while(|cell| cell.get().map(Box::as_ref))
  }

  #[inline]
  fn segment_capacity(&self, segment: usize) -> usize {
    self
      .base
      .saturating_mul(1 << segment)
      .min(SlotTable::<T>::MAX_ENTRIES)
  }
}

impl<T> Debug for Bucket<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Bucket")
      .field("len", &self.len())
      .field("capacity", &self.capacity())
      .field("segments", &self.tables().count())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::HashSet;
  use std::sync::Arc;
  use std::sync::Barrier;
  use std::thread;

  use crate::core::table::Bucket;
  use crate::core::table::BucketKey;

  #[test]
  fn test_new_is_unallocated() {
    let bucket: Bucket<u64> = Bucket::new(16);

    assert!(bucket.is_empty());
    assert_eq!(bucket.capacity(), 0);
  }

  #[test]
  fn test_grows_into_new_segments() {
    let bucket: Bucket<u64> = Bucket::new(16);
    let mut keys: Vec<BucketKey> = Vec::new();

    for index in 0..100 {
      keys.push(bucket.insert(index));
    }

    assert_eq!(bucket.len(), 100);
    assert_eq!(bucket.capacity(), 16 + 32 + 64);

    for (index, key) in keys.iter().enumerate() {
      assert_eq!(bucket.with(*key, |data| *data), Some(index as u64));
    }

    assert_eq!(keys.last().map(BucketKey::segment), Some(2));
  }

  #[test]
  fn test_insert_with_sees_final_key() {
    let bucket: Bucket<BucketKey> = Bucket::new(16);

    for _ in 0..40 {
      let key: BucketKey = bucket.insert_with(|key| key);

      assert_eq!(bucket.with(key, |data| *data), Some(key));
    }
  }

  #[test]
  fn test_remove_and_reuse() {
    let bucket: Bucket<u64> = Bucket::new(16);
    let keys: Vec<BucketKey> = (0..16).map(|index| bucket.insert(index)).collect();

    assert!(bucket.remove(keys[3]));
    assert!(!bucket.remove(keys[3]));
    assert!(bucket.with(keys[3], |_| ()).is_none());

    let key: BucketKey = bucket.insert(99);

    assert_eq!(key.segment(), 0);
    assert_eq!(bucket.capacity(), 16);
    assert_eq!(bucket.len(), 16);
  }

  #[test]
  fn test_find_map_and_collect_keys() {
    let bucket: Bucket<u64> = Bucket::new(16);

    for index in 0..50 {
      bucket.insert(index);
    }

    assert_eq!(bucket.find_map(|_, data| (*data == 42).then_some(*data)), Some(42));
    assert_eq!(bucket.collect_keys(|data| data % 10 == 0).len(), 5);
  }

  #[test]
  fn stress_concurrent_growth() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 1000;

    let bucket: Arc<Bucket<usize>> = Arc::new(Bucket::new(16));
    let barrier: Arc<Barrier> = Arc::new(Barrier::new(THREADS));

    let threads: Vec<_> = (0..THREADS)
      .map(|thread| {
        let bucket: Arc<Bucket<usize>> = Arc::clone(&bucket);
        let barrier: Arc<Barrier> = Arc::clone(&barrier);

        thread::spawn(move || {
          barrier.wait();

          (0..PER_THREAD)
            .map(|index| bucket.insert(thread * PER_THREAD + index))
            .collect::<Vec<BucketKey>>()
        })
      })
      .collect();

    let mut keys: HashSet<BucketKey> = HashSet::new();

    for handle in threads {
      keys.extend(handle.join().unwrap());
    }

    assert_eq!(keys.len(), THREADS * PER_THREAD);
    assert_eq!(bucket.len(), THREADS * PER_THREAD);
  }
}
