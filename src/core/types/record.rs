//! Immutable entry and template records.
//!
//! # Hash Layout
//!
//! A record with `n` fields spreads its 64-bit hash over `n` equal slices
//! of `max(64 / n, 4)` bits. Field `i` owns bits `[i * bits, (i + 1) * bits)`
//! as long as the slice fits in 64 bits; later fields are not hashed. Each
//! non-wildcard field contributes the low bits of its fingerprint to its
//! slice.
//!
//! A template is matched against entries with as many or more fields than
//! itself (a supertype template declares a prefix of the subtype's
//! fields), so a template's [`MatchDescriptor`] is always computed for the
//! *entry's* layout. Within one layout the fast-reject test
//! `entry.hash() & mask != hash` can only fail if some non-wildcard field
//! differs, so it never rejects a real match.

use hashbrown::HashSet;
use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::OnceLock;

use crate::consts::HASH_LAYOUTS;
use crate::consts::MIN_FIELD_HASH_BITS;
use crate::core::FieldValue;
use crate::core::TypeName;

// -----------------------------------------------------------------------------
// Hash Layout
// -----------------------------------------------------------------------------

/// Returns the layout index shared by every record with `field_count` fields.
#[inline]
pub(crate) const fn layout_of(field_count: usize) -> usize {
  if field_count < HASH_LAYOUTS {
    field_count
  } else {
    HASH_LAYOUTS - 1
  }
}

/// Returns the per-field bit width of `layout`.
#[inline]
const fn field_bits(layout: usize) -> u32 {
  if layout == 0 {
    return u64::BITS;
  }

  let bits: u32 = u64::BITS / layout as u32;

  if bits < MIN_FIELD_HASH_BITS {
    MIN_FIELD_HASH_BITS
  } else {
    bits
  }
}

/// Returns the `(shift, mask)` of field `index` in `layout`, or `None` if
/// the field lies past the hashed prefix.
#[inline]
const fn field_slice(layout: usize, index: usize) -> Option<(u32, u64)> {
  let bits: u32 = field_bits(layout);
  let shift: u64 = index as u64 * bits as u64;

  if shift + bits as u64 > u64::BITS as u64 {
    return None;
  }

  let mask: u64 = if bits == u64::BITS {
    u64::MAX
  } else {
    (1 << bits) - 1
  };

  Some((shift as u32, mask << shift))
}

#[inline]
fn fold_hash<'a, I>(layout: usize, fields: I) -> MatchDescriptor
where
  I: IntoIterator<Item = &'a Option<FieldValue>>,
{
  let mut descriptor: MatchDescriptor = MatchDescriptor::ANY;

  for (index, field) in fields.into_iter().enumerate() {
    let Some((shift, mask)) = field_slice(layout, index) else {
      break;
    };

    if let Some(value) = field {
      descriptor.mask |= mask;
      descriptor.hash |= (value.fingerprint() << shift) & mask;
    }
  }

  descriptor
}

// -----------------------------------------------------------------------------
// Match Descriptor
// -----------------------------------------------------------------------------

/// Cached `(mask, hash)` pair used to reject entries before comparing
/// fields.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct MatchDescriptor {
  mask: u64,
  hash: u64,
}

impl MatchDescriptor {
  /// Descriptor admitting every entry.
  pub const ANY: Self = Self { mask: 0, hash: 0 };

  #[inline]
  pub const fn mask(&self) -> u64 {
    self.mask
  }

  #[inline]
  pub const fn hash(&self) -> u64 {
    self.hash
  }

  /// Returns `false` if an entry with `entry_hash` cannot match.
  #[inline]
  pub const fn admits(&self, entry_hash: u64) -> bool {
    entry_hash & self.mask == self.hash
  }
}

// -----------------------------------------------------------------------------
// Descriptor Cache
// -----------------------------------------------------------------------------

/// Lazily computed descriptors of one template, one per entry layout.
pub(crate) struct DescriptorCache {
  layouts: [OnceLock<MatchDescriptor>; HASH_LAYOUTS],
}

impl DescriptorCache {
  #[inline]
  pub(crate) const fn new() -> Self {
    Self {
      layouts: [const { OnceLock::new() }; HASH_LAYOUTS],
    }
  }

  /// Returns the descriptor of `template` for entries in `layout`.
  #[inline]
  pub(crate) fn get(&self, template: &EntryRecord, layout: usize) -> MatchDescriptor {
    debug_assert!(layout < HASH_LAYOUTS, "DescriptorCache::get requires a saturated layout");

    match self.layouts.get(layout) {
      Some(cell) => *cell.get_or_init(|| template.descriptor(layout)),
      None => template.descriptor(layout),
    }
  }

  /// Fast reject followed by the exact match of `template` against `entry`.
  #[inline]
  pub(crate) fn admits(&self, template: &EntryRecord, entry: &EntryRecord) -> bool {
    self
      .get(template, layout_of(entry.field_count()))
      .admits(entry.hash())
      && template.matches(entry)
  }
}

impl Debug for DescriptorCache {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_list()
      .entries(self.layouts.iter().filter_map(OnceLock::get))
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Record Error
// -----------------------------------------------------------------------------

/// Errors detected while building an [`EntryRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
  /// The type lists itself among its superclasses.
  SelfAncestor(TypeName),
  /// The root type appears in a superclass chain.
  RootAncestor,
  /// A superclass appears more than once.
  DuplicateAncestor(TypeName),
  /// The root type was given superclasses.
  RootExtends,
  /// An entry of the root type was requested.
  RootEntry,
  /// An entry (not a template) contains a wildcard field.
  WildcardField(usize),
}

impl Display for RecordError {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::SelfAncestor(name) => write!(f, "type `{name}` extends itself"),
      Self::RootAncestor => f.write_str("root type listed as a superclass"),
      Self::DuplicateAncestor(name) => write!(f, "superclass `{name}` listed twice"),
      Self::RootExtends => f.write_str("root type cannot have superclasses"),
      Self::RootEntry => f.write_str("entries cannot have the root type"),
      Self::WildcardField(index) => write!(f, "entry field {index} is a wildcard"),
    }
  }
}

impl Error for RecordError {}

// -----------------------------------------------------------------------------
// Entry Record
// -----------------------------------------------------------------------------

/// Immutable representation of one written entry or one template.
///
/// Entries never contain wildcards; templates may. Both carry their exact
/// type, their strict superclass chain (nearest first, root omitted), and
/// a hash computed from their own field layout.
///
/// # Examples
///
/// ```
/// use tuplex::core::{EntryRecord, TypeName};
///
/// let dog = EntryRecord::builder(TypeName::new("Dog"))
///   .extends(TypeName::new("Animal"))
///   .field("rex")
///   .field(3_i64)
///   .entry()
///   .unwrap();
///
/// let any_animal = EntryRecord::builder(TypeName::new("Animal"))
///   .wildcard()
///   .template()
///   .unwrap();
///
/// assert!(any_animal.matches(&dog));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct EntryRecord {
  type_name: TypeName,
  superclasses: Box<[TypeName]>,
  fields: Box<[Option<FieldValue>]>,
  hash: u64,
}

impl EntryRecord {
  /// Starts building a record of type `type_name`.
  #[inline]
  pub fn builder(type_name: TypeName) -> EntryRecordBuilder {
    EntryRecordBuilder::new(type_name)
  }

  /// Returns a template of `type_name` with no field constraints.
  #[inline]
  pub fn any_of(type_name: TypeName) -> Self {
    Self {
      type_name,
      superclasses: Box::new([]),
      fields: Box::new([]),
      hash: 0,
    }
  }

  #[inline]
  pub const fn type_name(&self) -> TypeName {
    self.type_name
  }

  #[inline]
  pub fn superclasses(&self) -> &[TypeName] {
    &self.superclasses
  }

  #[inline]
  pub fn fields(&self) -> &[Option<FieldValue>] {
    &self.fields
  }

  #[inline]
  pub fn field_count(&self) -> usize {
    self.fields.len()
  }

  /// Returns the hash of this record under its own field layout.
  #[inline]
  pub const fn hash(&self) -> u64 {
    self.hash
  }

  /// Returns `true` if any field is a wildcard.
  #[inline]
  pub fn has_wildcards(&self) -> bool {
    self.fields.iter().any(Option::is_none)
  }

  /// Returns `true` if this record is of type `ancestor` or derives from it.
  ///
  /// Every record is assignable to [`TypeName::ROOT`].
  #[inline]
  pub fn is_assignable_to(&self, ancestor: TypeName) -> bool {
    ancestor.is_root() || ancestor == self.type_name || self.superclasses.contains(&ancestor)
  }

  /// Returns `true` if `other` has the same type and the same fields.
  #[inline]
  pub fn is_field_equal(&self, other: &Self) -> bool {
    self.type_name == other.type_name && self.fields == other.fields
  }

  /// Computes this template's descriptor for entries in `layout`.
  #[inline]
  pub fn descriptor(&self, layout: usize) -> MatchDescriptor {
    fold_hash(layout, self.fields.iter())
  }

  /// Exact match of this template against `entry`.
  ///
  /// The entry must be assignable to this template's type, have at least
  /// as many fields, and agree on every non-wildcard field.
  pub fn matches(&self, entry: &Self) -> bool {
    if self.fields.len() > entry.fields.len() {
      return false;
    }

    if !entry.is_assignable_to(self.type_name) {
      return false;
    }

    self
      .fields
      .iter()
      .zip(entry.fields.iter())
      .all(|(expect, actual)| match expect {
        Some(expect) => actual.as_ref() == Some(expect),
        None => true,
      })
  }
}

impl Debug for EntryRecord {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("EntryRecord")
      .field("type_name", &self.type_name)
      .field("superclasses", &self.superclasses)
      .field("fields", &self.fields)
      .field("hash", &format_args!("{:#018x}", self.hash))
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Entry Record Builder
// -----------------------------------------------------------------------------

/// Builder for [`EntryRecord`].
#[derive(Clone, Debug)]
pub struct EntryRecordBuilder {
  type_name: TypeName,
  superclasses: Vec<TypeName>,
  fields: Vec<Option<FieldValue>>,
}

impl EntryRecordBuilder {
  #[inline]
  fn new(type_name: TypeName) -> Self {
    Self {
      type_name,
      superclasses: Vec::new(),
      fields: Vec::new(),
    }
  }

  /// Appends the next (more distant) superclass.
  #[inline]
  pub fn extends(mut self, superclass: TypeName) -> Self {
    self.superclasses.push(superclass);
    self
  }

  /// Appends a chain of superclasses, nearest first.
  #[inline]
  pub fn extends_all<I>(mut self, chain: I) -> Self
  where
    I: IntoIterator<Item = TypeName>,
  {
    self.superclasses.extend(chain);
    self
  }

  /// Appends a concrete field value.
  #[inline]
  pub fn field<T>(mut self, value: T) -> Self
  where
    T: Into<FieldValue>,
  {
    self.fields.push(Some(value.into()));
    self
  }

  /// Appends a wildcard field.
  #[inline]
  pub fn wildcard(mut self) -> Self {
    self.fields.push(None);
    self
  }

  /// Appends fields as given; `None` is a wildcard.
  #[inline]
  pub fn fields<I>(mut self, fields: I) -> Self
  where
    I: IntoIterator<Item = Option<FieldValue>>,
  {
    self.fields.extend(fields);
    self
  }

  /// Builds a template record; wildcards are allowed.
  ///
  /// # Errors
  ///
  /// Returns [`RecordError`] if the superclass chain is malformed.
  pub fn template(self) -> Result<EntryRecord, RecordError> {
    self.validate_chain()?;
    Ok(self.finish())
  }

  /// Builds an entry record; wildcards are rejected.
  ///
  /// # Errors
  ///
  /// Returns [`RecordError`] if the superclass chain is malformed, the
  /// type is the root type, or any field is a wildcard.
  pub fn entry(self) -> Result<EntryRecord, RecordError> {
    if self.type_name.is_root() {
      return Err(RecordError::RootEntry);
    }

    if let Some(index) = self.fields.iter().position(Option::is_none) {
      return Err(RecordError::WildcardField(index));
    }

    self.validate_chain()?;
    Ok(self.finish())
  }

  fn validate_chain(&self) -> Result<(), RecordError> {
    if self.type_name.is_root() && !self.superclasses.is_empty() {
      return Err(RecordError::RootExtends);
    }

    let mut seen: HashSet<TypeName> = HashSet::with_capacity(self.superclasses.len());

    for superclass in self.superclasses.iter().copied() {
      if superclass.is_root() {
        return Err(RecordError::RootAncestor);
      }

      if superclass == self.type_name {
        return Err(RecordError::SelfAncestor(superclass));
      }

      if !seen.insert(superclass) {
        return Err(RecordError::DuplicateAncestor(superclass));
      }
    }

    Ok(())
  }

  fn finish(self) -> EntryRecord {
    let layout: usize = layout_of(self.fields.len());
    let hash: u64 = fold_hash(layout, self.fields.iter()).hash;

    EntryRecord {
      type_name: self.type_name,
      superclasses: self.superclasses.into_boxed_slice(),
      fields: self.fields.into_boxed_slice(),
      hash,
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  fn animal() -> TypeName {
    TypeName::new("record::Animal")
  }

  fn dog() -> TypeName {
    TypeName::new("record::Dog")
  }

  fn dog_entry(name: &str, age: i64) -> EntryRecord {
    EntryRecord::builder(dog())
      .extends(animal())
      .field(name)
      .field(age)
      .entry()
      .unwrap()
  }

  #[test]
  fn test_field_bits() {
    assert_eq!(field_bits(0), 64);
    assert_eq!(field_bits(1), 64);
    assert_eq!(field_bits(2), 32);
    assert_eq!(field_bits(3), 21);
    assert_eq!(field_bits(16), 4);
    assert_eq!(field_bits(40), 4);
  }

  #[test]
  fn test_field_slice_stops_at_64_bits() {
    assert_eq!(field_slice(3, 2), Some((42, ((1 << 21) - 1) << 42)));
    assert_eq!(field_slice(3, 3), None);
    assert_eq!(field_slice(16, 15), Some((60, 0xF << 60)));
    assert_eq!(field_slice(16, 16), None);
    assert_eq!(field_slice(1, 0), Some((0, u64::MAX)));
  }

  #[test]
  fn test_layout_of_saturates() {
    assert_eq!(layout_of(0), 0);
    assert_eq!(layout_of(16), 16);
    assert_eq!(layout_of(17), 16);
    assert_eq!(layout_of(1000), 16);
  }

  #[test]
  fn test_entry_hash_reproducible() {
    let a: EntryRecord = dog_entry("rex", 3);
    let b: EntryRecord = dog_entry("rex", 3);

    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.field_count(), 2);
  }

  #[test]
  fn test_entry_rejects_wildcard() {
    let result: Result<EntryRecord, RecordError> = EntryRecord::builder(dog()).field(1_i64).wildcard().entry();

    assert_eq!(result, Err(RecordError::WildcardField(1)));
  }

  #[test]
  fn test_chain_validation() {
    let result = EntryRecord::builder(dog()).extends(dog()).template();
    assert_eq!(result, Err(RecordError::SelfAncestor(dog())));

    let result = EntryRecord::builder(dog()).extends(TypeName::ROOT).template();
    assert_eq!(result, Err(RecordError::RootAncestor));

    let result = EntryRecord::builder(dog()).extends(animal()).extends(animal()).template();
    assert_eq!(result, Err(RecordError::DuplicateAncestor(animal())));

    let result = EntryRecord::builder(TypeName::ROOT).extends(animal()).template();
    assert_eq!(result, Err(RecordError::RootExtends));

    let result = EntryRecord::builder(TypeName::ROOT).entry();
    assert_eq!(result, Err(RecordError::RootEntry));
  }

  #[test]
  fn test_supertype_template_matches() {
    let entry: EntryRecord = dog_entry("rex", 3);
    let template: EntryRecord = EntryRecord::builder(animal()).field("rex").template().unwrap();
    let descriptor: MatchDescriptor = template.descriptor(layout_of(entry.field_count()));

    assert!(descriptor.admits(entry.hash()));
    assert!(template.matches(&entry));
  }

  #[test]
  fn test_unrelated_type_does_not_match() {
    let entry: EntryRecord = dog_entry("rex", 3);
    let template: EntryRecord = EntryRecord::any_of(TypeName::new("record::Cat"));

    assert!(!template.matches(&entry));
    assert!(EntryRecord::any_of(TypeName::ROOT).matches(&entry));
  }

  #[test]
  fn test_longer_template_does_not_match() {
    let entry: EntryRecord = dog_entry("rex", 3);
    let template: EntryRecord = EntryRecord::builder(dog())
      .wildcard()
      .wildcard()
      .wildcard()
      .template()
      .unwrap();

    assert!(!template.matches(&entry));
  }

  #[test]
  fn test_field_equality() {
    let a: EntryRecord = EntryRecord::builder(dog()).field("rex").wildcard().template().unwrap();
    let b: EntryRecord = EntryRecord::builder(dog()).field("rex").wildcard().template().unwrap();
    let c: EntryRecord = EntryRecord::builder(dog()).wildcard().field("rex").template().unwrap();

    assert!(a.is_field_equal(&b));
    assert!(!a.is_field_equal(&c));
  }

  #[test]
  fn test_descriptor_cache_is_stable() {
    let entry: EntryRecord = dog_entry("rex", 3);
    let other: EntryRecord = dog_entry("fido", 3);
    let template: EntryRecord = EntryRecord::builder(animal()).field("rex").template().unwrap();
    let cache: DescriptorCache = DescriptorCache::new();

    assert_eq!(cache.get(&template, 2), template.descriptor(2));
    assert_eq!(cache.get(&template, 2), cache.get(&template, 2));
    assert!(cache.admits(&template, &entry));
    assert!(!cache.admits(&template, &other));
  }

  fn field_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
      any::<bool>().prop_map(FieldValue::from),
      any::<i64>().prop_map(FieldValue::from),
      "[a-z]{0,6}".prop_map(FieldValue::from),
    ]
  }

  proptest! {
    /// The fast reject never rejects an entry the exact comparison accepts.
    #[test]
    fn prop_mask_has_no_false_negatives(
      values in prop::collection::vec(field_strategy(), 0..24),
      others in prop::collection::vec(field_strategy(), 24),
      pattern in prop::collection::vec(0_u8..3, 24),
      prefix in 0_usize..24,
    ) {
      let entry: EntryRecord = EntryRecord::builder(dog())
        .extends(animal())
        .fields(values.iter().cloned().map(Some))
        .entry()
        .unwrap();

      // 0 = wildcard, 1 = same value, 2 = a possibly different value.
      let fields: Vec<Option<FieldValue>> = values
        .iter()
        .take(prefix.min(values.len()))
        .enumerate()
        .map(|(index, value)| match pattern[index] {
          0 => None,
          1 => Some(value.clone()),
          _ => Some(others[index].clone()),
        })
        .collect();

      let template: EntryRecord = EntryRecord::builder(animal()).fields(fields).template().unwrap();
      let descriptor: MatchDescriptor = template.descriptor(layout_of(entry.field_count()));

      if template.matches(&entry) {
        prop_assert!(descriptor.admits(entry.hash()));
      }
    }
  }
}
