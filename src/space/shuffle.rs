use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::utils::time;

/// Odd multiplier used to decorrelate successive per-call seeds.
const CALL_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Lock-free source of random permutations.
///
/// Every call derives a fresh [`SmallRng`] from the configured seed and a
/// call counter, so two shufflers created with the same seed produce the
/// same sequence of permutations when called in the same order.
pub struct Shuffler {
  seed: u64,
  calls: AtomicU64,
}

impl Shuffler {
  /// Creates a shuffler with a fixed seed.
  #[inline]
  pub const fn new(seed: u64) -> Self {
    Self {
      seed,
      calls: AtomicU64::new(0),
    }
  }

  /// Creates a shuffler seeded from the wall clock.
  #[inline]
  pub fn from_clock() -> Self {
    let now: Duration = time::unix();
    Self::new(now.as_secs() ^ ((now.subsec_nanos() as u64) << 32))
  }

  #[inline]
  pub const fn seed(&self) -> u64 {
    self.seed
  }

  /// Shuffles `items` in place with a fresh random permutation.
  pub fn shuffle<T>(&self, items: &mut [T]) {
    if items.len() < 2 {
      return;
    }

    let call: u64 = self.calls.fetch_add(1, Ordering::Relaxed);
    let mut rng: SmallRng = SmallRng::seed_from_u64(mix(self.seed, call));

    items.shuffle(&mut rng);
  }
}

impl Debug for Shuffler {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Shuffler")
      .field("seed", &self.seed)
      .field("calls", &self.calls.load(Ordering::Relaxed))
      .finish()
  }
}

#[inline]
const fn mix(seed: u64, call: u64) -> u64 {
  let data: u64 = seed ^ call.wrapping_add(1).wrapping_mul(CALL_MIX);
  data ^ (data >> 31)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::space::Shuffler;

  #[test]
  fn test_same_seed_same_sequence() {
    let a: Shuffler = Shuffler::new(7);
    let b: Shuffler = Shuffler::new(7);

    for _ in 0..10 {
      let mut left: Vec<u32> = (0..32).collect();
      let mut right: Vec<u32> = (0..32).collect();

      a.shuffle(&mut left);
      b.shuffle(&mut right);

      assert_eq!(left, right);
    }
  }

  #[test]
  fn test_shuffle_is_permutation() {
    let shuffler: Shuffler = Shuffler::from_clock();
    let mut items: Vec<u32> = (0..100).collect();

    shuffler.shuffle(&mut items);
    items.sort_unstable();

    assert_eq!(items, (0..100).collect::<Vec<u32>>());
  }

  #[test]
  fn test_successive_calls_differ() {
    let shuffler: Shuffler = Shuffler::new(11);
    let mut first: Vec<u32> = (0..32).collect();
    let mut second: Vec<u32> = (0..32).collect();

    shuffler.shuffle(&mut first);
    shuffler.shuffle(&mut second);

    assert_ne!(first, second);
  }
}
