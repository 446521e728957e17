use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tracing::trace;
use triomphe::Arc;

use crate::consts::TRACING_TARGET;
use crate::core::Bucket;
use crate::core::BucketKey;
use crate::core::EntryCookie;
use crate::core::EntryRecord;
use crate::core::Timestamp;
use crate::core::TypeName;
use crate::error::fatal;
use crate::space::EntryHandle;

/// Every live entry of one exact type.
pub struct EntryBucket {
  type_name: TypeName,
  handles: Bucket<Arc<EntryHandle>>,
}

impl EntryBucket {
  /// Creates an empty bucket whose first segment holds `capacity` entries.
  #[inline]
  pub fn new(type_name: TypeName, capacity: usize) -> Self {
    Self {
      type_name,
      handles: Bucket::new(capacity),
    }
  }

  #[inline]
  pub fn type_name(&self) -> TypeName {
    self.type_name
  }

  /// Returns the number of stored entries.
  #[inline]
  pub fn len(&self) -> usize {
    self.handles.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.handles.is_empty()
  }

  /// Stores `record` under a fresh cookie.
  ///
  /// # Panics
  ///
  /// Raises a `SysCap` exception if the bucket cannot grow any further.
  #[inline]
  pub fn add(&self, record: Arc<EntryRecord>, expires: Timestamp) -> Arc<EntryHandle> {
    self.add_with_cookie(record, EntryCookie::new(), expires)
  }

  /// Stores `record` under a caller-supplied cookie.
  pub(crate) fn add_with_cookie(&self, record: Arc<EntryRecord>, cookie: EntryCookie, expires: Timestamp) -> Arc<EntryHandle> {
    debug_assert!(
      record.type_name() == self.type_name,
      "EntryBucket::add requires that the record type matches the bucket",
    );

    let mut created: Option<Arc<EntryHandle>> = None;

    let _key: BucketKey = self.handles.insert_with(|location| {
      let handle: Arc<EntryHandle> = Arc::new(EntryHandle::new(record, cookie, expires, location));
      created = Some(Arc::clone(&handle));
      handle
    });

    match created {
      Some(handle) => handle,
      None => fatal!("bucket insert skipped its initializer"),
    }
  }

  /// Removes `handle` from this bucket.
  ///
  /// Returns `false` if the handle was already removed.
  pub fn remove(&self, handle: &EntryHandle) -> bool {
    debug_assert!(
      handle.type_name() == self.type_name,
      "EntryBucket::remove requires a handle of the bucket type",
    );

    if !handle.mark_removed() {
      return false;
    }

    self.handles.remove(handle.location())
  }

  /// Removes every entry expired at `now`, returning the removed handles.
  pub fn reap(&self, now: Timestamp) -> Vec<Arc<EntryHandle>> {
    let mut expired: Vec<Arc<EntryHandle>> = Vec::new();

    self.handles.for_each(|_, handle| {
      if handle.is_expired(now) {
        expired.push(Arc::clone(handle));
      }
    });

    expired.retain(|handle| self.remove(handle));

    if !expired.is_empty() {
      trace!(target: TRACING_TARGET, type_name = %self.type_name, count = expired.len(), "reaped entries");
    }

    expired
  }

  /// Calls `f` on every stored handle, including removed or expired ones
  /// that have not been unlinked yet.
  pub fn for_each<F>(&self, mut f: F)
  where
    F: FnMut(&Arc<EntryHandle>),
  {
    self.handles.for_each(|_, handle| f(handle));
  }

  /// Returns the first non-`None` result of `f` over the stored handles.
  pub fn find_map<F, R>(&self, mut f: F) -> Option<R>
  where
    F: FnMut(&Arc<EntryHandle>) -> Option<R>,
  {
    self.handles.find_map(|_, handle| f(handle))
  }
}

impl Debug for EntryBucket {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("EntryBucket")
      .field("type_name", &self.type_name)
      .field("handles", &self.handles)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
