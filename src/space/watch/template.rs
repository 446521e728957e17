use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Arc as StdArc;
use triomphe::Arc;

use crate::core::Bucket;
use crate::core::BucketKey;
use crate::core::DescriptorCache;
use crate::core::EntryRecord;
use crate::core::Timestamp;
use crate::space::watch::WatcherEntry;
use crate::space::TransitionWatcher;
use crate::space::WatcherId;

/// One template together with every watcher registered against a
/// field-equal copy of it.
///
/// Once the watcher set drains the handle is *retired*: it accepts no new
/// watchers and is unlinked from its bucket. Adding and retiring are
/// serialized by a small lock; matching never takes it.
pub struct TemplateHandle {
  template: Arc<EntryRecord>,
  descriptors: DescriptorCache,
  watchers: Bucket<WatcherEntry>,
  retired: Mutex<bool>,
}

impl TemplateHandle {
  pub(crate) fn new(template: Arc<EntryRecord>, watcher_capacity: usize) -> Self {
    Self {
      template,
      descriptors: DescriptorCache::new(),
      watchers: Bucket::new(watcher_capacity),
      retired: Mutex::new(false),
    }
  }

  #[inline]
  pub fn template(&self) -> &Arc<EntryRecord> {
    &self.template
  }

  /// Returns the number of registered watchers.
  #[inline]
  pub fn len(&self) -> usize {
    self.watchers.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.watchers.is_empty()
  }

  #[inline]
  pub fn is_retired(&self) -> bool {
    *self.retired.lock()
  }

  /// Two-phase match of this template against `entry`.
  #[inline]
  pub fn admits(&self, entry: &EntryRecord) -> bool {
    self.descriptors.admits(&self.template, entry)
  }

  /// Adds a watcher, or returns `None` if the handle has been retired.
  pub(crate) fn add(&self, id: WatcherId, watcher: StdArc<dyn TransitionWatcher>) -> Option<BucketKey> {
    let retired: MutexGuard<'_, bool> = self.retired.lock();

    if *retired {
      return None;
    }

    Some(self.watchers.insert(WatcherEntry { id, watcher }))
  }

  /// Removes the watcher at `key`; `false` if it was already removed.
  #[inline]
  pub(crate) fn remove(&self, key: BucketKey) -> bool {
    self.watchers.remove(key)
  }

  /// Retires the handle if it has no watchers left.
  ///
  /// Returns `true` only for the call that performed the retirement.
  pub(crate) fn try_retire(&self) -> bool {
    let mut retired: MutexGuard<'_, bool> = self.retired.lock();

    if *retired || !self.watchers.is_empty() {
      return false;
    }

    *retired = true;
    true
  }

  /// Removes every watcher expired at `now`, returning how many were
  /// removed by this call.
  pub(crate) fn reap(&self, now: Timestamp) -> usize {
    self
      .watchers
      .collect_keys(|entry| entry.watcher.expiration().is_expired(now))
      .into_iter()
      .filter(|key| self.watchers.remove(*key))
      .count()
  }

  /// Calls `f` on every registered watcher.
  #[inline]
  pub(crate) fn for_each_watcher<F>(&self, mut f: F)
  where
    F: FnMut(&WatcherEntry),
  {
    self.watchers.for_each(|_, entry| f(entry));
  }
}

impl Debug for TemplateHandle {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TemplateHandle")
      .field("template", &self.template)
      .field("watchers", &self.watchers)
      .field("retired", &self.is_retired())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::num::NonZeroU64;
  use std::sync::Arc as StdArc;
  use triomphe::Arc;

  use crate::core::BucketKey;
  use crate::core::EntryRecord;
  use crate::core::Ordinal;
  use crate::core::Timestamp;
  use crate::core::TypeName;
  use crate::space::EntryTransition;
  use crate::space::TemplateHandle;
  use crate::space::TransitionWatcher;
  use crate::space::WatcherId;

  struct Expiring(Timestamp);

  impl TransitionWatcher for Expiring {
    fn expiration(&self) -> Timestamp {
      self.0
    }

    fn is_interested(&self, _: &EntryTransition, _: Ordinal) -> bool {
      true
    }
  }

  fn id(value: u64) -> WatcherId {
    WatcherId::new(NonZeroU64::new(value).unwrap())
  }

  fn handle() -> TemplateHandle {
    let template: EntryRecord = EntryRecord::any_of(TypeName::new("template::Dog"));
    TemplateHandle::new(Arc::new(template), 16)
  }

  #[test]
  fn test_retire_only_when_empty() {
    let handle: TemplateHandle = handle();
    let key: BucketKey = handle.add(id(1), StdArc::new(Expiring(Timestamp::FOREVER))).unwrap();

    assert!(!handle.try_retire());
    assert!(handle.remove(key));
    assert!(!handle.remove(key));
    assert!(handle.try_retire());
    assert!(!handle.try_retire());
    assert!(handle.is_retired());
  }

  #[test]
  fn test_retired_rejects_watchers() {
    let handle: TemplateHandle = handle();

    assert!(handle.try_retire());
    assert!(handle.add(id(1), StdArc::new(Expiring(Timestamp::FOREVER))).is_none());
    assert!(handle.is_empty());
  }

  #[test]
  fn test_reap_expired_watchers() {
    let handle: TemplateHandle = handle();

    for value in 1..=6 {
      let expires: Timestamp = Timestamp::from_millis(value * 10);
      handle.add(id(value), StdArc::new(Expiring(expires))).unwrap();
    }

    assert_eq!(handle.reap(Timestamp::from_millis(30)), 3);
    assert_eq!(handle.reap(Timestamp::from_millis(30)), 0);
    assert_eq!(handle.len(), 3);
  }
}
