use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Identifies one occupancy of one slot in a [`SlotTable`].
///
/// The low bits select the slot; the high bits are a serial number that
/// advances every time the slot is recycled, so a stale key never resolves
/// to a later occupant.
///
/// [`SlotTable`]: crate::core::SlotTable
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SlotKey(usize);

impl SlotKey {
  /// Mask of the bits a key may occupy.
  ///
  /// The top bit is kept clear so that no key can collide with the
  /// reservation marker used by the free list.
  pub(crate) const MASK: usize = usize::MAX >> 1;

  #[inline]
  pub(crate) const fn new(bits: usize) -> Self {
    Self(bits & Self::MASK)
  }

  /// Returns the raw bits of this key.
  #[inline]
  pub const fn into_bits(self) -> usize {
    self.0
  }
}

impl Debug for SlotKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "SlotKey({:#x})", self.0)
  }
}

impl Display for SlotKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "#{}", self.0)
  }
}
