use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::time::Duration;

use crate::utils::time;

/// Wall-clock deadline in milliseconds since the Unix epoch.
///
/// Deadlines are opaque to the engine: they are supplied by the lease
/// authority and only ever compared against a caller-provided `now`.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Timestamp {
  millis: u64,
}

impl Timestamp {
  /// A deadline that never passes.
  pub const FOREVER: Self = Self::from_millis(u64::MAX);

  /// The Unix epoch.
  pub const EPOCH: Self = Self::from_millis(0);

  /// Returns the current wall-clock time.
  #[inline]
  pub fn now() -> Self {
    Self::from_duration(time::unix())
  }

  #[inline]
  pub const fn from_millis(millis: u64) -> Self {
    Self { millis }
  }

  #[inline]
  pub const fn as_millis(&self) -> u64 {
    self.millis
  }

  /// Converts a duration since the epoch, saturating at [`FOREVER`].
  ///
  /// [`FOREVER`]: Self::FOREVER
  #[inline]
  pub const fn from_duration(since_epoch: Duration) -> Self {
    let millis: u128 = since_epoch.as_millis();

    if millis >= u64::MAX as u128 {
      Self::FOREVER
    } else {
      Self::from_millis(millis as u64)
    }
  }

  /// Returns the deadline `duration` after `self`, saturating at
  /// [`FOREVER`].
  ///
  /// [`FOREVER`]: Self::FOREVER
  #[inline]
  pub const fn after(&self, duration: Duration) -> Self {
    let delta: u128 = duration.as_millis();

    if delta >= u64::MAX as u128 {
      return Self::FOREVER;
    }

    Self::from_millis(self.millis.saturating_add(delta as u64))
  }

  /// Returns `true` if this deadline has passed at `now`.
  #[inline]
  pub const fn is_expired(&self, now: Self) -> bool {
    self.millis <= now.millis
  }

  #[inline]
  pub const fn is_forever(&self) -> bool {
    self.millis == u64::MAX
  }
}

impl Debug for Timestamp {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self, f)
  }
}

impl Display for Timestamp {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    if self.is_forever() {
      f.write_str("forever")
    } else {
      write!(f, "{}ms", self.millis)
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
