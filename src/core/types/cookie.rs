use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::LazyLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::utils::time;

/// Odd multiplier used to scatter the clock bits of the process seed.
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Per-process seed occupying the high half of every cookie.
static PROCESS_SEED: LazyLock<u64> = LazyLock::new(|| init_seed(time::unix()));

/// Counter occupying the low half of every cookie.
static COOKIE_COUNTER: AtomicU64 = AtomicU64::new(1);

// -----------------------------------------------------------------------------
// Entry Cookie
// -----------------------------------------------------------------------------

/// Opaque 128-bit identifier of one stored entry.
///
/// Fresh cookies combine a per-process seed derived from the wall clock
/// with a process-wide counter, so cookies from different runs are very
/// unlikely to collide. Persisted cookies are brought back with
/// [`EntryCookie::from_bits`].
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntryCookie {
  bits: u128,
}

impl EntryCookie {
  /// Generates a new, process-unique cookie.
  #[expect(clippy::new_without_default, reason = "each call is unique")]
  #[inline]
  pub fn new() -> Self {
    let seed: u64 = *PROCESS_SEED;
    let number: u64 = COOKIE_COUNTER.fetch_add(1, Ordering::Relaxed);

    Self::from_parts(seed, number)
  }

  /// Restores a cookie from its raw bits.
  #[inline]
  pub const fn from_bits(bits: u128) -> Self {
    Self { bits }
  }

  /// Returns the raw bits of this cookie.
  #[inline]
  pub const fn into_bits(self) -> u128 {
    self.bits
  }

  #[inline]
  pub(crate) const fn from_parts(seed: u64, number: u64) -> Self {
    Self::from_bits(((seed as u128) << u64::BITS) | number as u128)
  }

  #[inline]
  pub(crate) const fn seed(&self) -> u64 {
    (self.bits >> u64::BITS) as u64
  }

  #[inline]
  pub(crate) const fn number(&self) -> u64 {
    self.bits as u64
  }
}

impl Debug for EntryCookie {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self, f)
  }
}

impl Display for EntryCookie {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "#Cookie<{:016x}.{}>", self.seed(), self.number())
  }
}

#[inline]
fn init_seed(timestamp: Duration) -> u64 {
  let mut data: u64 = timestamp.as_secs();
  data ^= (timestamp.subsec_nanos() as u64) << 32;
  data = data.wrapping_mul(SEED_MIX);
  data ^ (data >> 29)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::HashSet;
  use std::sync::Arc;
  use std::sync::Mutex;
  use std::thread;

  use crate::core::EntryCookie;

  #[test]
  fn test_new_unique() {
    let a: EntryCookie = EntryCookie::new();
    let b: EntryCookie = EntryCookie::new();

    assert_ne!(a, b);
    assert_eq!(a.seed(), b.seed());
  }

  #[test]
  fn test_from_into_bits() {
    let bits: u128 = 0x0123_4567_89AB_CDEF_FEDC_BA98_7654_3210;

    assert_eq!(EntryCookie::from_bits(bits).into_bits(), bits);
  }

  #[test]
  fn test_parts() {
    let cookie: EntryCookie = EntryCookie::from_parts(7, 42);

    assert_eq!(cookie.seed(), 7);
    assert_eq!(cookie.number(), 42);
    assert_eq!(format!("{cookie}"), "#Cookie<0000000000000007.42>");
  }

  #[test]
  fn test_unique_across_threads() {
    let seen: Arc<Mutex<HashSet<EntryCookie>>> = Arc::new(Mutex::new(HashSet::new()));

    let threads: Vec<_> = (0..8)
      .map(|_| {
        let seen: Arc<Mutex<HashSet<EntryCookie>>> = Arc::clone(&seen);

        thread::spawn(move || {
          for _ in 0..1000 {
            assert!(seen.lock().unwrap().insert(EntryCookie::new()));
          }
        })
      })
      .collect();

    for handle in threads {
      handle.join().unwrap();
    }

    assert_eq!(seen.lock().unwrap().len(), 8000);
  }
}
