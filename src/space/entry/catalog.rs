use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tracing::debug;
use tracing::trace;
use triomphe::Arc;

use crate::consts::DEFAULT_BUCKET_CAPACITY;
use crate::consts::TRACING_TARGET;
use crate::core::DescriptorCache;
use crate::core::EntryCookie;
use crate::core::EntryRecord;
use crate::core::Timestamp;
use crate::core::TypeName;
use crate::space::EntryBucket;
use crate::space::EntryHandle;
use crate::space::TypeIndex;

/// All stored entries, grouped by exact type and indexed by cookie.
pub struct EntryCatalog {
  buckets: DashMap<TypeName, Arc<EntryBucket>>,
  cookies: DashMap<EntryCookie, Arc<EntryHandle>>,
  bucket_capacity: usize,
}

impl EntryCatalog {
  /// Creates an empty catalog; new buckets start with `bucket_capacity`
  /// slots.
  pub fn new(bucket_capacity: usize) -> Self {
    Self {
      buckets: DashMap::new(),
      cookies: DashMap::new(),
      bucket_capacity,
    }
  }

  /// Returns the number of stored entries.
  pub fn len(&self) -> usize {
    self.buckets().iter().map(|bucket| bucket.len()).sum()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the number of exact types with a bucket.
  #[inline]
  pub fn bucket_count(&self) -> usize {
    self.buckets.len()
  }

  /// Returns the bucket of `type_name`, creating it if absent.
  pub fn bucket_for(&self, type_name: TypeName) -> Arc<EntryBucket> {
    if let Some(bucket) = self.bucket(type_name) {
      return bucket;
    }

    let bucket = self.buckets.entry(type_name).or_insert_with(|| {
      debug!(target: TRACING_TARGET, %type_name, "new entry bucket");
      Arc::new(EntryBucket::new(type_name, self.bucket_capacity))
    });

    Arc::clone(bucket.value())
  }

  /// Returns the bucket of `type_name` without creating it.
  #[inline]
  pub fn bucket(&self, type_name: TypeName) -> Option<Arc<EntryBucket>> {
    self
      .buckets
      .get(&type_name)
      .map(|bucket| Arc::clone(bucket.value()))
  }

  /// Stores `record` under a fresh cookie.
  pub fn insert(&self, record: Arc<EntryRecord>, expires: Timestamp) -> Arc<EntryHandle> {
    let handle: Arc<EntryHandle> = self.bucket_for(record.type_name()).add(record, expires);
    self.cookies.insert(handle.cookie(), Arc::clone(&handle));

    // A take that won before the cookie landed could not unlink it.
    if handle.is_removed() {
      self.unlink(&handle);
    }

    trace!(target: TRACING_TARGET, cookie = %handle.cookie(), type_name = %handle.type_name(), "insert");

    handle
  }

  /// Stores `record` under a persisted `cookie`.
  ///
  /// Restoring a cookie that is already present returns the existing
  /// handle unchanged.
  pub fn restore(&self, record: Arc<EntryRecord>, cookie: EntryCookie, expires: Timestamp) -> Arc<EntryHandle> {
    match self.cookies.entry(cookie) {
      Entry::Occupied(entry) => Arc::clone(entry.get()),
      Entry::Vacant(entry) => {
        let bucket: Arc<EntryBucket> = self.bucket_for(record.type_name());
        let handle: Arc<EntryHandle> = bucket.add_with_cookie(record, cookie, expires);

        entry.insert(Arc::clone(&handle));
        handle
      }
    }
  }

  /// Removes `handle`; `false` if it was already removed.
  pub fn remove(&self, handle: &Arc<EntryHandle>) -> bool {
    let removed: bool = match self.bucket(handle.type_name()) {
      Some(bucket) => bucket.remove(handle),
      None => handle.mark_removed(),
    };

    if removed {
      self.unlink(handle);
      trace!(target: TRACING_TARGET, cookie = %handle.cookie(), "remove");
    }

    removed
  }

  /// Looks up a live entry by cookie.
  pub fn handle_for(&self, cookie: EntryCookie) -> Option<Arc<EntryHandle>> {
    self
      .cookies
      .get(&cookie)
      .map(|handle| Arc::clone(handle.value()))
      .filter(|handle| !handle.is_removed())
  }

  /// Removes every entry expired at `now`, returning the removed handles.
  pub fn reap(&self, now: Timestamp) -> Vec<Arc<EntryHandle>> {
    let mut reaped: Vec<Arc<EntryHandle>> = Vec::new();

    for bucket in self.buckets() {
      reaped.extend(bucket.reap(now));
    }

    for handle in reaped.iter() {
      self.unlink(handle);
    }

    reaped
  }

  /// Returns the first live entry matching `template` that `accept` takes.
  ///
  /// Candidate types are every known subtype of the template type, visited
  /// in a random order. `accept` may decline a handle (for example after
  /// losing a removal race), in which case the search continues.
  pub fn find<F>(&self, template: &EntryRecord, types: &TypeIndex, now: Timestamp, mut accept: F) -> Option<Arc<EntryHandle>>
  where
    F: FnMut(&Arc<EntryHandle>) -> bool,
  {
    let descriptors: DescriptorCache = DescriptorCache::new();

    for type_name in types.subtypes_of(template.type_name()) {
      let Some(bucket) = self.bucket(type_name) else {
        continue;
      };

      let found: Option<Arc<EntryHandle>> = bucket.find_map(|handle| {
        if handle.is_live(now) && descriptors.admits(template, handle.record()) && accept(handle) {
          Some(Arc::clone(handle))
        } else {
          None
        }
      });

      if found.is_some() {
        return found;
      }
    }

    None
  }

  /// Returns every live entry matching `template`.
  pub fn matching(&self, template: &EntryRecord, types: &TypeIndex, now: Timestamp) -> Vec<Arc<EntryHandle>> {
    let descriptors: DescriptorCache = DescriptorCache::new();
    let mut output: Vec<Arc<EntryHandle>> = Vec::new();

    for type_name in types.subtypes_of(template.type_name()) {
      let Some(bucket) = self.bucket(type_name) else {
        continue;
      };

      bucket.for_each(|handle| {
        if handle.is_live(now) && descriptors.admits(template, handle.record()) {
          output.push(Arc::clone(handle));
        }
      });
    }

    output
  }

  /// Snapshot of every bucket, so no shard lock outlives the call.
  fn buckets(&self) -> Vec<Arc<EntryBucket>> {
    self
      .buckets
      .iter()
      .map(|bucket| Arc::clone(bucket.value()))
      .collect()
  }

  #[inline]
  fn unlink(&self, handle: &Arc<EntryHandle>) {
    let _ignore: Option<_> = self
      .cookies
      .remove_if(&handle.cookie(), |_, stored| Arc::ptr_eq(stored, handle));
  }
}

impl Default for EntryCatalog {
  #[inline]
  fn default() -> Self {
    Self::new(DEFAULT_BUCKET_CAPACITY)
  }
}

impl Debug for EntryCatalog {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("EntryCatalog")
      .field("buckets", &self.buckets.len())
      .field("cookies", &self.cookies.len())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
