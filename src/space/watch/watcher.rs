use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::num::NonZeroU64;
use std::sync::Arc;

use crate::core::BucketKey;
use crate::core::Ordinal;
use crate::core::Timestamp;
use crate::core::TypeName;
use crate::space::EntryTransition;

// -----------------------------------------------------------------------------
// Transition Watcher
// -----------------------------------------------------------------------------

/// A party waiting for entries that match a template.
///
/// Implementations decide for themselves whether a matching transition is
/// of interest, for example a blocking read only cares about available
/// entries while a notification registration cares about new ones.
pub trait TransitionWatcher: Send + Sync {
  /// Deadline after which the watcher is removed by a reap.
  fn expiration(&self) -> Timestamp;

  /// Returns `true` if `transition` should be delivered to this watcher.
  ///
  /// Only called for transitions whose entry matches the registered
  /// template.
  fn is_interested(&self, transition: &EntryTransition, ordinal: Ordinal) -> bool;
}

// -----------------------------------------------------------------------------
// Watcher Id
// -----------------------------------------------------------------------------

/// Identity of one watcher registration.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct WatcherId(NonZeroU64);

impl WatcherId {
  #[inline]
  pub(crate) const fn new(value: NonZeroU64) -> Self {
    Self(value)
  }

  #[inline]
  pub const fn get(self) -> u64 {
    self.0.get()
  }
}

impl Debug for WatcherId {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "WatcherId({})", self.0)
  }
}

impl Display for WatcherId {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "#Watcher<{}>", self.0)
  }
}

// -----------------------------------------------------------------------------
// Watcher Key
// -----------------------------------------------------------------------------

/// Returned by a registration; locates the watcher for cancellation.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct WatcherKey {
  template_type: TypeName,
  template: BucketKey,
  watcher: BucketKey,
  id: WatcherId,
}

impl WatcherKey {
  #[inline]
  pub(crate) const fn new(template_type: TypeName, template: BucketKey, watcher: BucketKey, id: WatcherId) -> Self {
    Self {
      template_type,
      template,
      watcher,
      id,
    }
  }

  #[inline]
  pub const fn template_type(&self) -> TypeName {
    self.template_type
  }

  /// Location of the template handle in its bucket.
  #[inline]
  pub const fn template(&self) -> BucketKey {
    self.template
  }

  /// Location of the watcher in its template handle.
  #[inline]
  pub const fn watcher(&self) -> BucketKey {
    self.watcher
  }

  #[inline]
  pub const fn id(&self) -> WatcherId {
    self.id
  }
}

// -----------------------------------------------------------------------------
// Watcher Entry
// -----------------------------------------------------------------------------

/// A registered watcher as stored in its template handle.
pub(crate) struct WatcherEntry {
  pub(crate) id: WatcherId,
  pub(crate) watcher: Arc<dyn TransitionWatcher>,
}

impl Debug for WatcherEntry {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("WatcherEntry")
      .field("id", &self.id)
      .field("expires", &self.watcher.expiration())
      .finish()
  }
}
