//! Subtype graph of every type the space has seen.
//!
//! The index maps each type to the set of its *immediate* subclasses.
//! Edges are only ever added, so a query racing a write sees either the
//! old graph or a superset of it.

use dashmap::DashMap;
use hashbrown::HashSet;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tracing::debug;
use tracing::trace;
use triomphe::Arc;

use crate::consts::TRACING_TARGET;
use crate::core::EntryRecord;
use crate::core::TypeName;
use crate::space::Shuffler;
use crate::tyre::AppendSet;

type Children = Arc<AppendSet<TypeName>>;

/// Concurrent type name → immediate subclasses map.
///
/// [`TypeName::ROOT`] is always present and is the parent of every type
/// whose superclass chain ends without a known ancestor.
pub struct TypeIndex {
  edges: DashMap<TypeName, Children>,
  shuffler: Shuffler,
}

impl TypeIndex {
  /// Creates an index containing only the root type.
  pub fn new(shuffler: Shuffler) -> Self {
    let this: Self = Self {
      edges: DashMap::new(),
      shuffler,
    };

    this.edges.insert(TypeName::ROOT, Arc::new(AppendSet::new()));
    this
  }

  /// Returns the number of known types, not counting the root.
  #[inline]
  pub fn len(&self) -> usize {
    self.edges.len().saturating_sub(1)
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns `true` if `type_name` has been recorded.
  #[inline]
  pub fn contains(&self, type_name: TypeName) -> bool {
    self.edges.contains_key(&type_name)
  }

  /// Records the type of `record` and its superclass chain.
  ///
  /// Walks the chain nearest first and stops at the first edge that is
  /// already known. Returns `true` if any edge was added.
  pub fn record_type(&self, record: &EntryRecord) -> bool {
    let mut child: TypeName = record.type_name();

    if child.is_root() {
      return false;
    }

    let _ignore: Children = self.children(child);
    let mut added: bool = false;

    for parent in record.superclasses().iter().copied() {
      if !self.children(parent).insert(child) {
        return added;
      }

      trace!(target: TRACING_TARGET, %parent, %child, "type edge");

      added = true;
      child = parent;
    }

    if self.children(TypeName::ROOT).insert(child) {
      trace!(target: TRACING_TARGET, parent = %TypeName::ROOT, %child, "type edge");
      added = true;
    }

    added
  }

  /// Returns every known subtype of `type_name` in a random order.
  ///
  /// The result contains `type_name` itself unless it is the root; for the
  /// root it contains every known type.
  pub fn subtypes_of(&self, type_name: TypeName) -> Vec<TypeName> {
    let mut visited: HashSet<TypeName> = HashSet::new();
    let mut pending: Vec<TypeName> = vec![type_name];
    let mut output: Vec<TypeName> = Vec::new();

    while let Some(next) = pending.pop() {
      if !visited.insert(next) {
        continue;
      }

      if !next.is_root() {
        output.push(next);
      }

      // Clone the set out so no shard lock is held during the walk.
      let children: Option<Children> = self.edges.get(&next).map(|set| Arc::clone(set.value()));

      if let Some(children) = children {
        children.for_each(|child| {
          if !visited.contains(&child) {
            pending.push(child);
          }
        });
      }
    }

    self.shuffler.shuffle(&mut output);
    output
  }

  /// Returns the immediate subclasses of `type_name` known so far.
  pub fn children_of(&self, type_name: TypeName) -> Vec<TypeName> {
    self
      .edges
      .get(&type_name)
      .map(|set| set.value().to_vec())
      .unwrap_or_default()
  }

  #[inline]
  pub fn shuffler(&self) -> &Shuffler {
    &self.shuffler
  }

  /// Returns the subclass set of `type_name`, creating it if absent.
  fn children(&self, type_name: TypeName) -> Children {
    if let Some(set) = self.edges.get(&type_name) {
      return Arc::clone(set.value());
    }

    let set = self.edges.entry(type_name).or_insert_with(|| {
      debug!(target: TRACING_TARGET, %type_name, "new type");
      Arc::new(AppendSet::new())
    });

    Arc::clone(set.value())
  }
}

impl Default for TypeIndex {
  #[inline]
  fn default() -> Self {
    Self::new(Shuffler::from_clock())
  }
}

impl Debug for TypeIndex {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TypeIndex")
      .field("types", &self.len())
      .field("shuffler", &self.shuffler)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::HashSet;
  use std::sync::Arc;
  use std::sync::Barrier;
  use std::thread;

  use crate::core::EntryRecord;
  use crate::core::TypeName;
  use crate::space::Shuffler;
  use crate::space::TypeIndex;

  fn ty(name: &str) -> TypeName {
    TypeName::new(&format!("type_index::{name}"))
  }

  fn record(name: &str, chain: &[&str]) -> EntryRecord {
    EntryRecord::builder(ty(name))
      .extends_all(chain.iter().map(|name| ty(name)))
      .template()
      .unwrap()
  }

  fn sorted(mut types: Vec<TypeName>) -> Vec<TypeName> {
    types.sort_unstable();
    types
  }

  #[test]
  fn test_root_always_present() {
    let index: TypeIndex = TypeIndex::new(Shuffler::new(1));

    assert!(index.contains(TypeName::ROOT));
    assert!(index.is_empty());
    assert!(index.subtypes_of(TypeName::ROOT).is_empty());
  }

  #[test]
  fn test_subtypes_follow_chain() {
    let index: TypeIndex = TypeIndex::new(Shuffler::new(1));

    assert!(index.record_type(&record("Dog", &["Animal", "Thing"])));
    assert!(index.record_type(&record("Cat", &["Animal", "Thing"])));
    assert!(index.record_type(&record("Rock", &["Thing"])));

    assert_eq!(
      sorted(index.subtypes_of(ty("Animal"))),
      sorted(vec![ty("Animal"), ty("Dog"), ty("Cat")]),
    );

    assert_eq!(
      sorted(index.subtypes_of(ty("Thing"))),
      sorted(vec![ty("Thing"), ty("Animal"), ty("Dog"), ty("Cat"), ty("Rock")]),
    );

    assert_eq!(sorted(index.subtypes_of(ty("Dog"))), vec![ty("Dog")]);
    assert_eq!(index.children_of(TypeName::ROOT), vec![ty("Thing")]);
    assert_eq!(index.len(), 5);
  }

  #[test]
  fn test_root_reaches_everything() {
    let index: TypeIndex = TypeIndex::new(Shuffler::new(2));

    index.record_type(&record("Dog", &["Animal"]));
    index.record_type(&record("Plain", &[]));

    assert_eq!(
      sorted(index.subtypes_of(TypeName::ROOT)),
      sorted(vec![ty("Dog"), ty("Animal"), ty("Plain")]),
    );
  }

  #[test]
  fn test_record_type_idempotent() {
    let index: TypeIndex = TypeIndex::new(Shuffler::new(3));

    assert!(index.record_type(&record("Puppy", &["Dog", "Animal"])));
    assert!(!index.record_type(&record("Puppy", &["Dog", "Animal"])));
    assert!(!index.record_type(&record("Dog", &["Animal"])));
    assert_eq!(index.len(), 3);
  }

  #[test]
  fn test_unknown_type_is_its_own_subtype() {
    let index: TypeIndex = TypeIndex::new(Shuffler::new(4));

    assert_eq!(index.subtypes_of(ty("Ghost")), vec![ty("Ghost")]);
  }

  #[test]
  fn test_subtypes_are_shuffled() {
    let index: TypeIndex = TypeIndex::new(Shuffler::new(5));

    for child in 0..16 {
      index.record_type(&record(&format!("Leaf{child}"), &["Tree"]));
    }

    let orders: HashSet<Vec<TypeName>> = (0..16).map(|_| index.subtypes_of(ty("Tree"))).collect();

    assert!(orders.len() > 1);
  }

  #[test]
  fn stress_concurrent_record_type() {
    const THREADS: usize = 8;
    const TYPES: usize = 64;

    let index: Arc<TypeIndex> = Arc::new(TypeIndex::new(Shuffler::new(6)));
    let barrier: Arc<Barrier> = Arc::new(Barrier::new(THREADS));

    let threads: Vec<_> = (0..THREADS)
      .map(|thread| {
        let index: Arc<TypeIndex> = Arc::clone(&index);
        let barrier: Arc<Barrier> = Arc::clone(&barrier);

        thread::spawn(move || {
          barrier.wait();

          for leaf in 0..TYPES {
            index.record_type(&record(&format!("Stress{thread}_{leaf}"), &["StressMid", "StressTop"]));
            index.record_type(&record(&format!("Shared{leaf}"), &["StressMid", "StressTop"]));
          }
        })
      })
      .collect();

    for handle in threads {
      handle.join().unwrap();
    }

    // Every leaf, the shared leaves, and the middle type.
    assert_eq!(index.subtypes_of(ty("StressMid")).len(), THREADS * TYPES + TYPES + 1);
    assert!(index.subtypes_of(TypeName::ROOT).contains(&ty("StressTop")));
  }
}
