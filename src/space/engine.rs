//! The space facade.
//!
//! [`Space`] owns the type index, the entry catalog, the watcher index and
//! the ordinal clock, and keeps them consistent: every write records its
//! type before the entry becomes findable, and every write or take is
//! stamped with an ordinal and matched against the registered watchers.
//!
//! Delivery, leasing and transactions live outside the space. Callers get
//! back the [`InterestSet`] of each transition and decide what to do with
//! it.

use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Arc as StdArc;
use tracing::debug;
use tracing::trace;
use triomphe::Arc;

use crate::consts::TRACING_TARGET;
use crate::core::EntryCookie;
use crate::core::EntryRecord;
use crate::core::Ordinal;
use crate::core::OrdinalClock;
use crate::core::RecordError;
use crate::core::Timestamp;
use crate::raise;
use crate::space::EntryCatalog;
use crate::space::EntryHandle;
use crate::space::EntryTransition;
use crate::space::InterestSet;
use crate::space::Shuffler;
use crate::space::SpaceConfig;
use crate::space::TransitionFlags;
use crate::space::TransitionWatcher;
use crate::space::TypeIndex;
use crate::space::WatcherIndex;
use crate::space::WatcherKey;
use crate::space::WatcherReap;

// -----------------------------------------------------------------------------
// Operation Results
// -----------------------------------------------------------------------------

/// Result of [`Space::write`].
#[derive(Debug)]
pub struct Written {
  pub handle: Arc<EntryHandle>,
  pub transition: EntryTransition,
  pub interested: InterestSet,
}

/// Result of [`Space::take`] and [`Space::take_by_cookie`].
#[derive(Debug)]
pub struct Taken {
  pub handle: Arc<EntryHandle>,
  pub transition: EntryTransition,
  pub interested: InterestSet,
}

/// Result of [`Space::reap`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReapStats {
  /// Expired entries removed.
  pub entries: usize,
  /// Expired watchers removed.
  pub watchers: usize,
  /// Empty template handles removed.
  pub templates: usize,
}

/// A persisted entry handed to [`Space::restore`] during recovery.
#[derive(Clone, Debug)]
pub struct StoredEntry {
  pub record: Arc<EntryRecord>,
  pub cookie: EntryCookie,
  pub expires: Timestamp,
}

// -----------------------------------------------------------------------------
// Space
// -----------------------------------------------------------------------------

/// A concurrent tuple space.
///
/// Every operation takes `&self` and may be called from any number of
/// threads.
///
/// # Examples
///
/// ```
/// use triomphe::Arc;
/// use tuplex::core::{EntryRecord, Timestamp, TypeName};
/// use tuplex::space::Space;
///
/// let space = Space::default();
///
/// let dog = EntryRecord::builder(TypeName::new("Dog"))
///   .extends(TypeName::new("Animal"))
///   .field("rex")
///   .entry()
///   .unwrap();
///
/// space.write(Arc::new(dog), Timestamp::FOREVER);
///
/// let any_animal = EntryRecord::any_of(TypeName::new("Animal"));
///
/// assert!(space.take(&any_animal, Timestamp::now()).is_some());
/// assert!(space.read(&any_animal, Timestamp::now()).is_none());
/// ```
pub struct Space {
  config: SpaceConfig,
  types: TypeIndex,
  catalog: EntryCatalog,
  watchers: WatcherIndex,
  clock: OrdinalClock,
}

impl Space {
  pub fn new(config: SpaceConfig) -> Self {
    let shuffler: Shuffler = match config.shuffle_seed {
      Some(seed) => Shuffler::new(seed),
      None => Shuffler::from_clock(),
    };

    debug!(
      target: TRACING_TARGET,
      bucket_capacity = config.bucket_capacity,
      template_capacity = config.template_capacity,
      watcher_capacity = config.watcher_capacity,
      shuffle_seed = shuffler.seed(),
      "new space",
    );

    Self {
      types: TypeIndex::new(shuffler),
      catalog: EntryCatalog::new(config.bucket_capacity),
      watchers: WatcherIndex::new(config.template_capacity, config.watcher_capacity),
      clock: OrdinalClock::new(),
      config,
    }
  }

  // ---------------------------------------------------------------------------
  // Entries
  // ---------------------------------------------------------------------------

  /// Stores `record` until `expires` and matches the write against every
  /// registered watcher.
  ///
  /// # Panics
  ///
  /// Raises a `BadArg` exception if `record` is a template.
  pub fn write(&self, record: Arc<EntryRecord>, expires: Timestamp) -> Written {
    if let Some(index) = record.fields().iter().position(Option::is_none) {
      raise!(Error, BadArg, RecordError::WildcardField(index));
    }

    if record.type_name().is_root() {
      raise!(Error, BadArg, RecordError::RootEntry);
    }

    self.types.record_type(&record);

    // Drawn before the entry becomes findable.
    let ordinal: Ordinal = self.clock.tick();
    let handle: Arc<EntryHandle> = self.catalog.insert(record, expires);
    let transition: EntryTransition = EntryTransition::written(Arc::clone(&handle), ordinal);
    let interested: InterestSet = self.watchers.collect_interested(&transition);

    trace!(
      target: TRACING_TARGET,
      cookie = %handle.cookie(),
      ordinal = %transition.ordinal(),
      interested = interested.len(),
      "write",
    );

    Written {
      handle,
      transition,
      interested,
    }
  }

  /// Returns a live entry matching `template` without removing it.
  #[inline]
  pub fn read(&self, template: &EntryRecord, now: Timestamp) -> Option<Arc<EntryHandle>> {
    self.catalog.find(template, &self.types, now, |_| true)
  }

  /// Removes and returns a live entry matching `template`.
  ///
  /// A match lost to a concurrent take is skipped and the search goes on.
  pub fn take(&self, template: &EntryRecord, now: Timestamp) -> Option<Taken> {
    let handle: Arc<EntryHandle> = self
      .catalog
      .find(template, &self.types, now, |handle| self.catalog.remove(handle))?;

    Some(self.taken(handle))
  }

  /// Removes the entry stored under `cookie`.
  pub fn take_by_cookie(&self, cookie: EntryCookie) -> Option<Taken> {
    let handle: Arc<EntryHandle> = self.catalog.handle_for(cookie)?;

    if !self.catalog.remove(&handle) {
      return None;
    }

    Some(self.taken(handle))
  }

  /// Returns every live entry matching `template`.
  #[inline]
  pub fn contents(&self, template: &EntryRecord, now: Timestamp) -> Vec<Arc<EntryHandle>> {
    self.catalog.matching(template, &self.types, now)
  }

  // ---------------------------------------------------------------------------
  // Watchers
  // ---------------------------------------------------------------------------

  #[inline]
  pub fn register(&self, watcher: StdArc<dyn TransitionWatcher>, template: Arc<EntryRecord>) -> WatcherKey {
    self.watchers.register(watcher, template)
  }

  #[inline]
  pub fn cancel(&self, key: &WatcherKey) -> bool {
    self.watchers.cancel(key)
  }

  /// Stamps an externally decided transition of `handle` with the next
  /// ordinal.
  #[inline]
  pub fn transition(&self, handle: Arc<EntryHandle>, flags: TransitionFlags) -> EntryTransition {
    EntryTransition::new(handle, flags, self.clock.tick())
  }

  /// Matches an externally built transition, such as a change in
  /// transactional visibility, against every registered watcher.
  #[inline]
  pub fn notify(&self, transition: &EntryTransition) -> InterestSet {
    self.watchers.collect_interested(transition)
  }

  // ---------------------------------------------------------------------------
  // Maintenance
  // ---------------------------------------------------------------------------

  /// Removes expired entries, expired watchers, and empty template
  /// handles.
  pub fn reap(&self, now: Timestamp) -> ReapStats {
    let entries: usize = self.catalog.reap(now).len();
    let watchers: WatcherReap = self.watchers.reap(now);

    let stats: ReapStats = ReapStats {
      entries,
      watchers: watchers.watchers,
      templates: watchers.templates,
    };

    debug!(
      target: TRACING_TARGET,
      %now,
      entries = stats.entries,
      watchers = stats.watchers,
      templates = stats.templates,
      "reap",
    );

    stats
  }

  /// Brings back one persisted entry under its original cookie.
  ///
  /// No transition is produced. Restoring a cookie that is already present
  /// returns the existing handle.
  pub fn restore(&self, stored: StoredEntry) -> Arc<EntryHandle> {
    self.types.record_type(&stored.record);
    self.catalog.restore(stored.record, stored.cookie, stored.expires)
  }

  /// Restores every entry of `entries`, returning how many were processed.
  pub fn recover<I>(&self, entries: I) -> usize
  where
    I: IntoIterator<Item = StoredEntry>,
  {
    let count: usize = entries
      .into_iter()
      .map(|stored| self.restore(stored))
      .count();

    debug!(target: TRACING_TARGET, count, "recover");

    count
  }

  // ---------------------------------------------------------------------------
  // Accessors
  // ---------------------------------------------------------------------------

  #[inline]
  pub fn config(&self) -> &SpaceConfig {
    &self.config
  }

  #[inline]
  pub fn types(&self) -> &TypeIndex {
    &self.types
  }

  #[inline]
  pub fn catalog(&self) -> &EntryCatalog {
    &self.catalog
  }

  #[inline]
  pub fn watchers(&self) -> &WatcherIndex {
    &self.watchers
  }

  /// Returns the ordinal of the most recent transition, if any.
  #[inline]
  pub fn last_ordinal(&self) -> Option<Ordinal> {
    self.clock.last()
  }

  #[inline]
  fn taken(&self, handle: Arc<EntryHandle>) -> Taken {
    let transition: EntryTransition = EntryTransition::removed(Arc::clone(&handle), self.clock.tick());
    let interested: InterestSet = self.watchers.collect_interested(&transition);

    trace!(
      target: TRACING_TARGET,
      cookie = %handle.cookie(),
      ordinal = %transition.ordinal(),
      interested = interested.len(),
      "take",
    );

    Taken {
      handle,
      transition,
      interested,
    }
  }
}

impl Default for Space {
  #[inline]
  fn default() -> Self {
    Self::new(SpaceConfig::default())
  }
}

impl Debug for Space {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Space")
      .field("types", &self.types)
      .field("catalog", &self.catalog)
      .field("watchers", &self.watchers)
      .field("clock", &self.clock)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
