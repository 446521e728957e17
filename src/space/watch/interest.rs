use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use hashbrown::hash_map::IntoIter;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Arc;

use crate::space::TransitionWatcher;
use crate::space::WatcherId;

/// Watchers interested in one transition, deduplicated by id.
#[derive(Clone, Default)]
pub struct InterestSet {
  watchers: HashMap<WatcherId, Arc<dyn TransitionWatcher>>,
}

impl InterestSet {
  #[inline]
  pub fn new() -> Self {
    Self {
      watchers: HashMap::new(),
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.watchers.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.watchers.is_empty()
  }

  #[inline]
  pub fn contains(&self, id: WatcherId) -> bool {
    self.watchers.contains_key(&id)
  }

  /// Adds a watcher; `false` if a watcher with `id` is already present.
  #[inline]
  pub fn insert(&mut self, id: WatcherId, watcher: Arc<dyn TransitionWatcher>) -> bool {
    match self.watchers.entry(id) {
      Entry::Occupied(_) => false,
      Entry::Vacant(entry) => {
        entry.insert(watcher);
        true
      }
    }
  }

  #[inline]
  pub fn get(&self, id: WatcherId) -> Option<&Arc<dyn TransitionWatcher>> {
    self.watchers.get(&id)
  }

  /// Returns the ids of every collected watcher, in no particular order.
  #[inline]
  pub fn ids(&self) -> impl Iterator<Item = WatcherId> + '_ {
    self.watchers.keys().copied()
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = (WatcherId, &Arc<dyn TransitionWatcher>)> + '_ {
    self.watchers.iter().map(|(id, watcher)| (*id, watcher))
  }
}

impl IntoIterator for InterestSet {
  type Item = (WatcherId, Arc<dyn TransitionWatcher>);
  type IntoIter = IntoIter<WatcherId, Arc<dyn TransitionWatcher>>;

  #[inline]
  fn into_iter(self) -> Self::IntoIter {
    self.watchers.into_iter()
  }
}

impl Debug for InterestSet {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_set().entries(self.watchers.keys()).finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::num::NonZeroU64;
  use std::sync::Arc;

  use crate::core::Ordinal;
  use crate::core::Timestamp;
  use crate::space::EntryTransition;
  use crate::space::InterestSet;
  use crate::space::TransitionWatcher;
  use crate::space::WatcherId;

  struct Always;

  impl TransitionWatcher for Always {
    fn expiration(&self) -> Timestamp {
      Timestamp::FOREVER
    }

    fn is_interested(&self, _: &EntryTransition, _: Ordinal) -> bool {
      true
    }
  }

  #[test]
  fn test_deduplicates_by_id() {
    let id: WatcherId = WatcherId::new(NonZeroU64::MIN);
    let mut set: InterestSet = InterestSet::new();

    assert!(set.insert(id, Arc::new(Always)));
    assert!(!set.insert(id, Arc::new(Always)));
    assert_eq!(set.len(), 1);
    assert!(set.contains(id));
    assert_eq!(set.into_iter().count(), 1);
  }
}
