use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ops::Deref;
use std::sync::LazyLock;

use crate::core::TypeTable;
use crate::core::TypeTableError;
use crate::error::fatal;
use crate::raise;

// -----------------------------------------------------------------------------
// Global Type Table
// -----------------------------------------------------------------------------

/// Process-wide type table, with the root name pinned to slot zero.
static TYPE_TABLE: LazyLock<TypeTable> = LazyLock::new(|| {
  let table: TypeTable = TypeTable::new();

  match table.insert("") {
    Ok(slot) if slot == TypeName::ROOT.into_slot() => table,
    Ok(_) => fatal!("root type not in slot zero"),
    Err(error) => fatal!(error),
  }
});

// -----------------------------------------------------------------------------
// Type Name
// -----------------------------------------------------------------------------

/// Interned name of an entry or template type.
///
/// A `TypeName` is a 32-bit handle into a process-wide table. Equality and
/// hashing compare handles; ordering compares the underlying strings.
///
/// [`TypeName::ROOT`] is the universal ancestor. Every type is a subtype of
/// it, and a template declared with it matches entries of any type.
///
/// # Examples
///
/// ```
/// use tuplex::core::TypeName;
///
/// let dog1 = TypeName::new("Dog");
/// let dog2 = TypeName::new("Dog");
///
/// assert_eq!(dog1, dog2);
/// assert_eq!(dog1.as_str(), "Dog");
/// assert!(TypeName::ROOT.is_root());
/// ```
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
#[repr(transparent)]
pub struct TypeName {
  slot: u32,
}

impl TypeName {
  /// The universal root type.
  pub const ROOT: Self = Self::from_slot(0);

  #[inline]
  pub(crate) const fn from_slot(slot: u32) -> Self {
    Self { slot }
  }

  #[inline]
  pub(crate) const fn into_slot(self) -> u32 {
    self.slot
  }

  /// Interns `name` and returns its handle.
  ///
  /// The empty string interns to [`TypeName::ROOT`].
  ///
  /// # Panics
  ///
  /// Raises a `SysCap` exception if `name` exceeds [`MAX_TYPE_NAME_BYTES`]
  /// or the table already holds [`MAX_TYPE_COUNT`] names.
  ///
  /// [`MAX_TYPE_NAME_BYTES`]: crate::consts::MAX_TYPE_NAME_BYTES
  /// [`MAX_TYPE_COUNT`]: crate::consts::MAX_TYPE_COUNT
  #[inline]
  pub fn new(name: &str) -> Self {
    match Self::try_new(name) {
      Ok(this) => this,
      Err(error) => raise!(Error, SysCap, error),
    }
  }

  /// Interns `name`, reporting capacity failures as an error.
  ///
  /// # Errors
  ///
  /// See [`TypeTableError`].
  #[inline]
  pub fn try_new(name: &str) -> Result<Self, TypeTableError> {
    TYPE_TABLE.insert(name).map(Self::from_slot)
  }

  /// Returns the handle of `name` if it has already been interned.
  #[inline]
  pub fn find(name: &str) -> Option<Self> {
    TYPE_TABLE.find(name).map(Self::from_slot)
  }

  /// Returns the interned string.
  #[inline]
  pub fn as_str(&self) -> &'static str {
    match TYPE_TABLE.lookup(self.slot) {
      Ok(data) => data,
      Err(error) => fatal!(error),
    }
  }

  /// Returns `true` if this is [`TypeName::ROOT`].
  #[inline]
  pub const fn is_root(&self) -> bool {
    self.slot == Self::ROOT.slot
  }

  /// Returns the number of type names interned so far, root included.
  #[inline]
  pub fn interned() -> usize {
    TYPE_TABLE.len()
  }
}

impl Debug for TypeName {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    if self.is_root() {
      f.write_str("<root>")
    } else {
      Display::fmt(self.as_str(), f)
    }
  }
}

impl Display for TypeName {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Debug::fmt(self, f)
  }
}

impl Default for TypeName {
  #[inline]
  fn default() -> Self {
    Self::ROOT
  }
}

impl PartialOrd for TypeName {
  #[inline]
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for TypeName {
  #[inline]
  fn cmp(&self, other: &Self) -> Ordering {
    Ord::cmp(self.as_str(), other.as_str())
  }
}

impl Deref for TypeName {
  type Target = str;

  #[inline]
  fn deref(&self) -> &Self::Target {
    self.as_str()
  }
}

impl From<&str> for TypeName {
  #[inline]
  fn from(other: &str) -> Self {
    Self::new(other)
  }
}

impl From<&String> for TypeName {
  #[inline]
  fn from(other: &String) -> Self {
    Self::new(other.as_str())
  }
}

impl PartialEq<str> for TypeName {
  #[inline]
  fn eq(&self, other: &str) -> bool {
    self.as_str() == other
  }
}

impl PartialEq<&str> for TypeName {
  #[inline]
  fn eq(&self, other: &&str) -> bool {
    self.as_str() == *other
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::panic;

  use crate::consts::MAX_TYPE_NAME_BYTES;
  use crate::core::TypeName;
  use crate::core::TypeTableError;

  #[test]
  fn test_root_is_empty_string() {
    assert_eq!(TypeName::new(""), TypeName::ROOT);
    assert_eq!(TypeName::ROOT.as_str(), "");
    assert_eq!(format!("{}", TypeName::ROOT), "<root>");
  }

  #[test]
  fn test_equality_by_slot() {
    let a: TypeName = TypeName::new("type_name::Equality");
    let b: TypeName = TypeName::from("type_name::Equality");

    assert_eq!(a, b);
    assert_eq!(a, "type_name::Equality");
    assert!(!a.is_root());
  }

  #[test]
  fn test_ordering_by_string() {
    let a: TypeName = TypeName::new("type_name::B");
    let b: TypeName = TypeName::new("type_name::A");

    assert!(b < a);
  }

  #[test]
  fn test_find() {
    assert_eq!(TypeName::find("type_name::NeverInterned"), None);

    let name: TypeName = TypeName::new("type_name::Interned");

    assert_eq!(TypeName::find("type_name::Interned"), Some(name));
  }

  #[test]
  fn test_too_large() {
    let name: String = "t".repeat(MAX_TYPE_NAME_BYTES + 1);

    assert_eq!(TypeName::try_new(&name), Err(TypeTableError::NameTooLarge));
    assert!(panic::catch_unwind(|| TypeName::new(&name)).is_err());
  }
}
