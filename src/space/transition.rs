use bitflags::bitflags;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use triomphe::Arc;

use crate::core::EntryRecord;
use crate::core::Ordinal;
use crate::space::EntryHandle;

// -----------------------------------------------------------------------------
// Transition Flags
// -----------------------------------------------------------------------------

bitflags! {
  /// State of an entry after a transition.
  #[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
  pub struct TransitionFlags: u8 {
    /// The entry can be read or taken.
    const AVAILABLE = 1 << 0;
    /// The entry is visible outside the transaction that wrote it.
    const VISIBLE   = 1 << 1;
    /// The transition was caused by a write.
    const NEW_ENTRY = 1 << 2;
  }
}

// -----------------------------------------------------------------------------
// Entry Transition
// -----------------------------------------------------------------------------

/// A change in the state of one entry, stamped with an ordinal.
#[derive(Clone)]
pub struct EntryTransition {
  handle: Arc<EntryHandle>,
  flags: TransitionFlags,
  ordinal: Ordinal,
}

impl EntryTransition {
  /// Creates a transition with externally decided flags.
  #[inline]
  pub fn new(handle: Arc<EntryHandle>, flags: TransitionFlags, ordinal: Ordinal) -> Self {
    Self {
      handle,
      flags,
      ordinal,
    }
  }

  /// A freshly written entry, available and visible.
  #[inline]
  pub fn written(handle: Arc<EntryHandle>, ordinal: Ordinal) -> Self {
    Self::new(handle, TransitionFlags::all(), ordinal)
  }

  /// An entry that has left the space.
  #[inline]
  pub fn removed(handle: Arc<EntryHandle>, ordinal: Ordinal) -> Self {
    Self::new(handle, TransitionFlags::empty(), ordinal)
  }

  #[inline]
  pub fn handle(&self) -> &Arc<EntryHandle> {
    &self.handle
  }

  #[inline]
  pub fn record(&self) -> &EntryRecord {
    self.handle.record()
  }

  #[inline]
  pub const fn flags(&self) -> TransitionFlags {
    self.flags
  }

  #[inline]
  pub const fn ordinal(&self) -> Ordinal {
    self.ordinal
  }

  #[inline]
  pub const fn is_available(&self) -> bool {
    self.flags.contains(TransitionFlags::AVAILABLE)
  }

  #[inline]
  pub const fn is_visible(&self) -> bool {
    self.flags.contains(TransitionFlags::VISIBLE)
  }

  #[inline]
  pub const fn is_new_entry(&self) -> bool {
    self.flags.contains(TransitionFlags::NEW_ENTRY)
  }
}

impl Debug for EntryTransition {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("EntryTransition")
      .field("cookie", &self.handle.cookie())
      .field("flags", &self.flags)
      .field("ordinal", &self.ordinal)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use triomphe::Arc;

  use crate::core::EntryRecord;
  use crate::core::Ordinal;
  use crate::core::Timestamp;
  use crate::core::TypeName;
  use crate::space::EntryBucket;
  use crate::space::EntryHandle;
  use crate::space::EntryTransition;
  use crate::space::TransitionFlags;

  fn handle() -> Arc<EntryHandle> {
    let bucket: EntryBucket = EntryBucket::new(TypeName::new("transition::Dog"), 16);
    let record: EntryRecord = EntryRecord::builder(bucket.type_name()).entry().unwrap();

    bucket.add(Arc::new(record), Timestamp::FOREVER)
  }

  #[test]
  fn test_written_flags() {
    let transition: EntryTransition = EntryTransition::written(handle(), Ordinal::FIRST);

    assert!(transition.is_available());
    assert!(transition.is_visible());
    assert!(transition.is_new_entry());
    assert_eq!(transition.ordinal(), Ordinal::FIRST);
  }

  #[test]
  fn test_removed_flags() {
    let transition: EntryTransition = EntryTransition::removed(handle(), Ordinal::FIRST);

    assert!(transition.flags().is_empty());
    assert!(!transition.is_available());
  }

  #[test]
  fn test_custom_flags() {
    let flags: TransitionFlags = TransitionFlags::AVAILABLE | TransitionFlags::NEW_ENTRY;
    let transition: EntryTransition = EntryTransition::new(handle(), flags, Ordinal::FIRST);

    assert!(transition.is_available());
    assert!(!transition.is_visible());
  }
}
