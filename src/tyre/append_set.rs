//! Lock-free, growth-only set.
//!
//! [`AppendSet`] is a singly linked list whose head is swapped in with a
//! CAS. Values are never removed, so a reader that has loaded the head can
//! walk the rest of the list without further synchronization, and a
//! concurrent insert can never hide an existing value.

use crossbeam_epoch as epoch;
use crossbeam_epoch::Atomic;
use crossbeam_epoch::CompareExchangeError;
use crossbeam_epoch::Guard;
use crossbeam_epoch::Owned;
use crossbeam_epoch::Shared;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::Acquire;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::atomic::Ordering::Release;

struct Node<T> {
  value: T,
  next: Atomic<Node<T>>,
}

/// A concurrent set that only ever grows.
///
/// Two threads inserting different values at the same time both succeed;
/// two threads inserting the same value produce exactly one element.
pub struct AppendSet<T> {
  head: Atomic<Node<T>>,
  len: AtomicUsize,
}

impl<T> AppendSet<T>
where
  T: Copy + Eq,
{
  /// Creates an empty set.
  #[inline]
  pub fn new() -> Self {
    Self {
      head: Atomic::null(),
      len: AtomicUsize::new(0),
    }
  }

  /// Returns the number of values in the set.
  #[inline]
  pub fn len(&self) -> usize {
    self.len.load(Acquire)
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Inserts `value`, returning `true` if it was not already present.
  pub fn insert(&self, value: T) -> bool {
    let guard: Guard = epoch::pin();
    let mut head: Shared<'_, Node<T>> = self.head.load(Acquire, &guard);

    if scan(head, Shared::null(), value, &guard) {
      return false;
    }

    let mut node: Owned<Node<T>> = Owned::new(Node {
      value,
      next: Atomic::null(),
    });

    loop {
      node.next.store(head, Relaxed);

      match self.head.compare_exchange(head, node, Release, Acquire, &guard) {
        Ok(_) => {
          let _ignore: usize = self.len.fetch_add(1, Release);
          return true;
        }
        Err(CompareExchangeError { current, new }) => {
          // Only the nodes pushed since `head` can hold a racing copy.
          if scan(current, head, value, &guard) {
            return false;
          }

          head = current;
          node = new;
        }
      }
    }
  }

  /// Returns `true` if `value` is in the set.
  #[inline]
  pub fn contains(&self, value: T) -> bool {
    let guard: Guard = epoch::pin();
    scan(self.head.load(Acquire, &guard), Shared::null(), value, &guard)
  }

  /// Calls `f` on every value, most recently inserted first.
  pub fn for_each<F>(&self, mut f: F)
  where
    F: FnMut(T),
  {
    let guard: Guard = epoch::pin();
    let mut cursor: Shared<'_, Node<T>> = self.head.load(Acquire, &guard);

    // SAFETY: Nodes are only freed by `Drop`, which requires `&mut self`.
    while let Some(node) = unsafe { cursor.as_ref() } {
      f(node.value);
      cursor = node.next.load(Acquire, &guard);
    }
  }

  /// Returns a snapshot of the current values.
  #[inline]
  pub fn to_vec(&self) -> Vec<T> {
    let mut output: Vec<T> = Vec::with_capacity(self.len());
    self.for_each(|value| output.push(value));
    output
  }
}

/// Walks from `from` up to (not including) `until`, looking for `value`.
#[inline]
fn scan<T>(from: Shared<'_, Node<T>>, until: Shared<'_, Node<T>>, value: T, guard: &Guard) -> bool
where
  T: Copy + Eq,
{
  let mut cursor: Shared<'_, Node<T>> = from;

  while cursor != until {
    // SAFETY: Nodes are only freed by `Drop`, which requires `&mut self`.
    let Some(node) = (unsafe { cursor.as_ref() }) else {
      break;
    };

    if node.value == value {
      return true;
    }

    cursor = node.next.load(Acquire, guard);
  }

  false
}

impl<T> Default for AppendSet<T>
where
  T: Copy + Eq,
{
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Drop for AppendSet<T> {
  fn drop(&mut self) {
    // SAFETY: `&mut self` means no other thread can reach the list.
    let guard: &Guard = unsafe { epoch::unprotected() };
    let mut cursor: Shared<'_, Node<T>> = self.head.load(Relaxed, guard);

    // SAFETY: Every node is owned by the list and visited exactly once.
    while let Some(node) = unsafe { cursor.try_into_owned() } {
      cursor = node.next.load(Relaxed, guard);
      drop(node);
    }
  }
}

impl<T> Debug for AppendSet<T>
where
  T: Copy + Eq + Debug,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_set().entries(self.to_vec()).finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::sync::Barrier;
  use std::thread;

  use crate::tyre::AppendSet;

  #[test]
  fn test_insert_and_contains() {
    let set: AppendSet<u32> = AppendSet::new();

    assert!(set.insert(1));
    assert!(set.insert(2));
    assert!(!set.insert(1));

    assert!(set.contains(1));
    assert!(set.contains(2));
    assert!(!set.contains(3));
    assert_eq!(set.len(), 2);
  }

  #[test]
  fn test_to_vec_newest_first() {
    let set: AppendSet<u32> = AppendSet::new();

    for value in 0..5 {
      set.insert(value);
    }

    assert_eq!(set.to_vec(), vec![4, 3, 2, 1, 0]);
  }

  #[test]
  fn stress_racing_inserts_keep_every_value() {
    const THREADS: u32 = 16;
    const VALUES: u32 = 200;

    let set: Arc<AppendSet<u32>> = Arc::new(AppendSet::new());
    let barrier: Arc<Barrier> = Arc::new(Barrier::new(THREADS as usize));

    let threads: Vec<_> = (0..THREADS)
      .map(|thread| {
        let set: Arc<AppendSet<u32>> = Arc::clone(&set);
        let barrier: Arc<Barrier> = Arc::clone(&barrier);

        thread::spawn(move || {
          barrier.wait();

          // Half the values are shared between threads, half are unique.
          for value in 0..VALUES {
            set.insert(value);
            set.insert(VALUES + thread * VALUES + value);
          }
        })
      })
      .collect();

    for handle in threads {
      handle.join().unwrap();
    }

    let mut values: Vec<u32> = set.to_vec();
    values.sort_unstable();

    assert_eq!(values, (0..VALUES * (THREADS + 1)).collect::<Vec<u32>>());
    assert_eq!(set.len(), values.len());
  }
}
