use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::num::NonZeroU64;

use crate::error::fatal;
use crate::loom::sync::atomic::AtomicU64;
use crate::loom::sync::atomic::Ordering;

// -----------------------------------------------------------------------------
// Ordinal
// -----------------------------------------------------------------------------

/// Sequence number giving watchers a total order over transitions.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Ordinal(NonZeroU64);

impl Ordinal {
  /// The first ordinal handed out by a fresh clock.
  pub const FIRST: Self = Self(NonZeroU64::MIN);

  /// Creates an ordinal from a raw value, or `None` for zero.
  #[inline]
  pub const fn new(value: u64) -> Option<Self> {
    match NonZeroU64::new(value) {
      Some(value) => Some(Self(value)),
      None => None,
    }
  }

  #[inline]
  pub const fn get(self) -> u64 {
    self.0.get()
  }
}

impl Debug for Ordinal {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "Ordinal({})", self.0)
  }
}

impl Display for Ordinal {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(&self.0, f)
  }
}

// -----------------------------------------------------------------------------
// Ordinal Clock
// -----------------------------------------------------------------------------

/// Source of strictly increasing [`Ordinal`]s.
///
/// Every call to [`tick`] returns a value greater than any value returned
/// before it, on any thread.
///
/// [`tick`]: Self::tick
pub struct OrdinalClock {
  next: AtomicU64,
}

impl OrdinalClock {
  /// Creates a clock whose first tick is [`Ordinal::FIRST`].
  #[inline]
  pub fn new() -> Self {
    Self {
      next: AtomicU64::new(Ordinal::FIRST.get()),
    }
  }

  /// Hands out the next ordinal.
  #[inline]
  pub fn tick(&self) -> Ordinal {
    let value: u64 = self.next.fetch_add(1, Ordering::Relaxed);

    match Ordinal::new(value) {
      Some(ordinal) => ordinal,
      None => fatal!("ordinal clock wrapped"),
    }
  }

  /// Returns the most recently issued ordinal, if any.
  #[inline]
  pub fn last(&self) -> Option<Ordinal> {
    Ordinal::new(self.next.load(Ordering::Relaxed) - 1)
  }
}

impl Default for OrdinalClock {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl Debug for OrdinalClock {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("OrdinalClock")
      .field("next", &self.next.load(Ordering::Relaxed))
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(all(test, not(loom)))]
mod tests {
  use std::sync::Arc;
  use std::sync::Barrier;
  use std::thread;

  use crate::core::Ordinal;
  use crate::core::OrdinalClock;

  #[test]
  fn test_first_tick() {
    let clock: OrdinalClock = OrdinalClock::new();

    assert_eq!(clock.last(), None);
    assert_eq!(clock.tick(), Ordinal::FIRST);
    assert_eq!(clock.last(), Some(Ordinal::FIRST));
  }

  #[test]
  fn test_zero_is_not_an_ordinal() {
    assert_eq!(Ordinal::new(0), None);
    assert_eq!(Ordinal::new(9).map(Ordinal::get), Some(9));
  }

  #[test]
  fn stress_ticks_strictly_increase() {
    const THREADS: usize = 8;
    const TICKS: usize = 2000;

    let clock: Arc<OrdinalClock> = Arc::new(OrdinalClock::new());
    let barrier: Arc<Barrier> = Arc::new(Barrier::new(THREADS));

    let threads: Vec<_> = (0..THREADS)
      .map(|_| {
        let clock: Arc<OrdinalClock> = Arc::clone(&clock);
        let barrier: Arc<Barrier> = Arc::clone(&barrier);

        thread::spawn(move || {
          barrier.wait();

          let ticks: Vec<Ordinal> = (0..TICKS).map(|_| clock.tick()).collect();

          assert!(ticks.windows(2).all(|pair| pair[0] < pair[1]));

          ticks
        })
      })
      .collect();

    let mut all: Vec<Ordinal> = Vec::new();

    for handle in threads {
      all.extend(handle.join().unwrap());
    }

    all.sort_unstable();
    all.dedup();

    assert_eq!(all.len(), THREADS * TICKS);
  }
}
