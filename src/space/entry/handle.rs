use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use triomphe::Arc;

use crate::core::BucketKey;
use crate::core::EntryCookie;
use crate::core::EntryRecord;
use crate::core::Timestamp;
use crate::core::TypeName;

/// One stored entry.
///
/// A handle is owned by the [`EntryBucket`] of its exact type and refers
/// back to its slot by key. The expiration may be replaced at any time by
/// the lease authority; removal happens at most once.
///
/// [`EntryBucket`]: crate::space::EntryBucket
pub struct EntryHandle {
  record: Arc<EntryRecord>,
  cookie: EntryCookie,
  expires: AtomicU64,
  location: BucketKey,
  removed: AtomicBool,
}

impl EntryHandle {
  #[inline]
  pub(crate) fn new(record: Arc<EntryRecord>, cookie: EntryCookie, expires: Timestamp, location: BucketKey) -> Self {
    Self {
      record,
      cookie,
      expires: AtomicU64::new(expires.as_millis()),
      location,
      removed: AtomicBool::new(false),
    }
  }

  #[inline]
  pub fn record(&self) -> &Arc<EntryRecord> {
    &self.record
  }

  #[inline]
  pub fn type_name(&self) -> TypeName {
    self.record.type_name()
  }

  #[inline]
  pub fn cookie(&self) -> EntryCookie {
    self.cookie
  }

  /// Returns the slot this handle occupies in its bucket.
  #[inline]
  pub fn location(&self) -> BucketKey {
    self.location
  }

  #[inline]
  pub fn expiration(&self) -> Timestamp {
    Timestamp::from_millis(self.expires.load(Ordering::Acquire))
  }

  /// Replaces the lease deadline of this entry.
  #[inline]
  pub fn set_expiration(&self, expires: Timestamp) {
    self.expires.store(expires.as_millis(), Ordering::Release);
  }

  #[inline]
  pub fn is_expired(&self, now: Timestamp) -> bool {
    self.expiration().is_expired(now)
  }

  #[inline]
  pub fn is_removed(&self) -> bool {
    self.removed.load(Ordering::Acquire)
  }

  /// Returns `true` if the handle is neither removed nor expired at `now`.
  #[inline]
  pub fn is_live(&self, now: Timestamp) -> bool {
    !self.is_removed() && !self.is_expired(now)
  }

  /// Flags the handle as removed; `true` only for the first caller.
  #[inline]
  pub(crate) fn mark_removed(&self) -> bool {
    !self.removed.swap(true, Ordering::AcqRel)
  }
}

impl Debug for EntryHandle {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("EntryHandle")
      .field("cookie", &self.cookie)
      .field("type_name", &self.type_name())
      .field("expires", &self.expiration())
      .field("location", &self.location)
      .field("removed", &self.is_removed())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use triomphe::Arc;

  use crate::core::BucketKey;
  use crate::core::EntryCookie;
  use crate::core::EntryRecord;
  use crate::core::SlotKey;
  use crate::core::Timestamp;
  use crate::core::TypeName;
  use crate::space::EntryHandle;

  fn handle(expires: Timestamp) -> EntryHandle {
    let record: EntryRecord = EntryRecord::builder(TypeName::new("handle::Dog"))
      .field("rex")
      .entry()
      .unwrap();

    EntryHandle::new(
      Arc::new(record),
      EntryCookie::new(),
      expires,
      BucketKey::new(0, SlotKey::new(0)),
    )
  }

  #[test]
  fn test_expiration_replaceable() {
    let handle: EntryHandle = handle(Timestamp::from_millis(100));

    assert!(handle.is_live(Timestamp::from_millis(50)));
    assert!(handle.is_expired(Timestamp::from_millis(100)));

    handle.set_expiration(Timestamp::FOREVER);

    assert!(!handle.is_expired(Timestamp::from_millis(100)));
    assert_eq!(handle.expiration(), Timestamp::FOREVER);
  }

  #[test]
  fn test_mark_removed_once() {
    let handle: EntryHandle = handle(Timestamp::FOREVER);

    assert!(handle.mark_removed());
    assert!(!handle.mark_removed());
    assert!(handle.is_removed());
    assert!(!handle.is_live(Timestamp::EPOCH));
  }
}
