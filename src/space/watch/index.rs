//! Registry of watchers, grouped by template type.
//!
//! # Matching
//!
//! An entry of type `T` can only match templates of `T`, of one of its
//! superclasses, or of the root type. For each of those buckets every
//! template handle first applies its cached descriptor for the entry's
//! layout, then the exact field comparison, and only then asks each of its
//! watchers whether the transition is of interest.

use dashmap::DashMap;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::iter;
use std::num::NonZeroU64;
use std::sync::Arc as StdArc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tracing::debug;
use tracing::trace;
use triomphe::Arc;

use crate::consts::DEFAULT_TEMPLATE_CAPACITY;
use crate::consts::DEFAULT_WATCHER_CAPACITY;
use crate::consts::TRACING_TARGET;
use crate::core::BucketKey;
use crate::core::EntryRecord;
use crate::core::Timestamp;
use crate::core::TypeName;
use crate::error::fatal;
use crate::space::EntryTransition;
use crate::space::InterestSet;
use crate::space::TemplateBucket;
use crate::space::TemplateHandle;
use crate::space::TransitionWatcher;
use crate::space::WatcherId;
use crate::space::WatcherKey;

// -----------------------------------------------------------------------------
// Watcher Reap
// -----------------------------------------------------------------------------

/// Outcome of one [`WatcherIndex::reap`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WatcherReap {
  /// Expired watchers removed.
  pub watchers: usize,
  /// Emptied template handles retired and removed.
  pub templates: usize,
}

// -----------------------------------------------------------------------------
// Watcher Index
// -----------------------------------------------------------------------------

/// Every registered watcher, reachable from the types it can match.
pub struct WatcherIndex {
  buckets: DashMap<TypeName, Arc<TemplateBucket>>,
  next_id: AtomicU64,
  template_capacity: usize,
  watcher_capacity: usize,
}

impl WatcherIndex {
  pub fn new(template_capacity: usize, watcher_capacity: usize) -> Self {
    Self {
      buckets: DashMap::new(),
      next_id: AtomicU64::new(1),
      template_capacity,
      watcher_capacity,
    }
  }

  /// Returns the number of registered watchers.
  pub fn len(&self) -> usize {
    self.buckets().iter().map(|bucket| bucket.watcher_count()).sum()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the number of live template handles.
  pub fn template_count(&self) -> usize {
    self.buckets().iter().map(|bucket| bucket.len()).sum()
  }

  /// Returns the bucket of `type_name` without creating it.
  #[inline]
  pub fn bucket(&self, type_name: TypeName) -> Option<Arc<TemplateBucket>> {
    self
      .buckets
      .get(&type_name)
      .map(|bucket| Arc::clone(bucket.value()))
  }

  /// Registers `watcher` against `template`.
  ///
  /// Watchers of field-equal templates share one template handle.
  pub fn register(&self, watcher: StdArc<dyn TransitionWatcher>, template: Arc<EntryRecord>) -> WatcherKey {
    let id: WatcherId = self.next_id();
    let type_name: TypeName = template.type_name();
    let bucket: Arc<TemplateBucket> = self.bucket_for(type_name);

    loop {
      let (location, handle): (BucketKey, Arc<TemplateHandle>) = match bucket.find_equal(&template) {
        Some(found) => found,
        None => bucket.insert(Arc::clone(&template)),
      };

      // The handle may have been retired since it was found; start over.
      if let Some(slot) = handle.add(id, StdArc::clone(&watcher)) {
        debug!(target: TRACING_TARGET, %id, %type_name, expires = %watcher.expiration(), "register");
        return WatcherKey::new(type_name, location, slot, id);
      }
    }
  }

  /// Collects every watcher interested in `transition`.
  pub fn collect_interested(&self, transition: &EntryTransition) -> InterestSet {
    let entry: &EntryRecord = transition.record();
    let mut interested: InterestSet = InterestSet::new();

    let candidates = iter::once(entry.type_name())
      .chain(entry.superclasses().iter().copied())
      .chain(iter::once(TypeName::ROOT));

    for type_name in candidates {
      let Some(bucket) = self.bucket(type_name) else {
        continue;
      };

      bucket.for_each(|_, handle| {
        if !handle.admits(entry) {
          return;
        }

        handle.for_each_watcher(|watcher| {
          if watcher.watcher.is_interested(transition, transition.ordinal()) {
            interested.insert(watcher.id, StdArc::clone(&watcher.watcher));
          }
        });
      });
    }

    trace!(
      target: TRACING_TARGET,
      cookie = %transition.handle().cookie(),
      ordinal = %transition.ordinal(),
      count = interested.len(),
      "collect interested",
    );

    interested
  }

  /// Removes the watcher registered under `key`.
  ///
  /// Returns `false` if it was already removed. A template handle left
  /// without watchers is retired and removed immediately.
  pub fn cancel(&self, key: &WatcherKey) -> bool {
    let Some(bucket) = self.bucket(key.template_type()) else {
      return false;
    };

    let Some(handle) = bucket.handle(key.template()) else {
      return false;
    };

    let removed: bool = handle.remove(key.watcher());

    if handle.try_retire() {
      bucket.remove(key.template());
    }

    if removed {
      trace!(target: TRACING_TARGET, id = %key.id(), "cancel");
    }

    removed
  }

  /// Removes every watcher expired at `now`, then every template handle
  /// left without watchers.
  pub fn reap(&self, now: Timestamp) -> WatcherReap {
    let mut stats: WatcherReap = WatcherReap::default();

    for bucket in self.buckets() {
      for (location, handle) in bucket.to_vec() {
        stats.watchers += handle.reap(now);

        if handle.try_retire() && bucket.remove(location) {
          stats.templates += 1;
        }
      }
    }

    if stats != WatcherReap::default() {
      debug!(
        target: TRACING_TARGET,
        watchers = stats.watchers,
        templates = stats.templates,
        "reaped watchers",
      );
    }

    stats
  }

  fn bucket_for(&self, type_name: TypeName) -> Arc<TemplateBucket> {
    if let Some(bucket) = self.bucket(type_name) {
      return bucket;
    }

    let bucket = self.buckets.entry(type_name).or_insert_with(|| {
      debug!(target: TRACING_TARGET, %type_name, "new template bucket");
      Arc::new(TemplateBucket::new(type_name, self.template_capacity, self.watcher_capacity))
    });

    Arc::clone(bucket.value())
  }

  /// Snapshot of every bucket, so no shard lock outlives the call.
  fn buckets(&self) -> Vec<Arc<TemplateBucket>> {
    self
      .buckets
      .iter()
      .map(|bucket| Arc::clone(bucket.value()))
      .collect()
  }

  #[inline]
  fn next_id(&self) -> WatcherId {
    match NonZeroU64::new(self.next_id.fetch_add(1, Ordering::Relaxed)) {
      Some(value) => WatcherId::new(value),
      None => fatal!("watcher ids wrapped"),
    }
  }
}

impl Default for WatcherIndex {
  #[inline]
  fn default() -> Self {
    Self::new(DEFAULT_TEMPLATE_CAPACITY, DEFAULT_WATCHER_CAPACITY)
  }
}

impl Debug for WatcherIndex {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("WatcherIndex")
      .field("buckets", &self.buckets.len())
      .field("next_id", &self.next_id.load(Ordering::Relaxed))
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
