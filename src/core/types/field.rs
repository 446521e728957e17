use hashbrown::DefaultHashBuilder;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::hash::BuildHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::LazyLock;

use crate::core::TypeName;

/// Hasher state shared by every field fingerprint in the process.
static FIELD_HASHER: LazyLock<DefaultHashBuilder> = LazyLock::new(DefaultHashBuilder::default);

// -----------------------------------------------------------------------------
// Field Value
// -----------------------------------------------------------------------------

/// The value of one entry field.
///
/// Floats compare and hash by bit pattern, so `NaN` equals itself and
/// `0.0` differs from `-0.0`.
#[derive(Clone)]
#[non_exhaustive]
pub enum FieldValue {
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(Box<str>),
  Bytes(Box<[u8]>),
  Type(TypeName),
}

impl FieldValue {
  /// Returns the 64-bit fingerprint used to build record hashes.
  ///
  /// Stable for the lifetime of the process.
  #[inline]
  pub fn fingerprint(&self) -> u64 {
    FIELD_HASHER.hash_one(self)
  }
}

impl Debug for FieldValue {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Bool(value) => Debug::fmt(value, f),
      Self::Int(value) => Debug::fmt(value, f),
      Self::Float(value) => Debug::fmt(value, f),
      Self::Str(value) => Debug::fmt(value, f),
      Self::Bytes(value) => write!(f, "<<{} bytes>>", value.len()),
      Self::Type(value) => write!(f, "type:{value}"),
    }
  }
}

impl PartialEq for FieldValue {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Bool(a), Self::Bool(b)) => a == b,
      (Self::Int(a), Self::Int(b)) => a == b,
      (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
      (Self::Str(a), Self::Str(b)) => a == b,
      (Self::Bytes(a), Self::Bytes(b)) => a == b,
      (Self::Type(a), Self::Type(b)) => a == b,
      _ => false,
    }
  }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
  fn hash<H: Hasher>(&self, state: &mut H) {
    match self {
      Self::Bool(value) => {
        state.write_u8(0);
        value.hash(state);
      }
      Self::Int(value) => {
        state.write_u8(1);
        value.hash(state);
      }
      Self::Float(value) => {
        state.write_u8(2);
        value.to_bits().hash(state);
      }
      Self::Str(value) => {
        state.write_u8(3);
        value.hash(state);
      }
      Self::Bytes(value) => {
        state.write_u8(4);
        value.hash(state);
      }
      Self::Type(value) => {
        state.write_u8(5);
        value.hash(state);
      }
    }
  }
}

// -----------------------------------------------------------------------------
// Extensions - From
// -----------------------------------------------------------------------------

macro_rules! impl_from {
  ($type:ty => $variant:ident) => {
    impl From<$type> for FieldValue {
      #[inline]
      fn from(other: $type) -> Self {
        Self::$variant(other.into())
      }
    }
  };
}

impl_from!(bool => Bool);
impl_from!(i64 => Int);
impl_from!(i32 => Int);
impl_from!(u32 => Int);
impl_from!(f64 => Float);
impl_from!(f32 => Float);
impl_from!(&str => Str);
impl_from!(String => Str);
impl_from!(&[u8] => Bytes);
impl_from!(Vec<u8> => Bytes);
impl_from!(TypeName => Type);

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::core::FieldValue;
  use crate::core::TypeName;

  #[test]
  fn test_equality_is_variant_aware() {
    assert_eq!(FieldValue::from(1_i64), FieldValue::from(1_i32));
    assert_ne!(FieldValue::from(1_i64), FieldValue::from(1.0_f64));
    assert_ne!(FieldValue::from("a"), FieldValue::from(b"a".as_slice()));
  }

  #[test]
  fn test_float_by_bits() {
    assert_eq!(FieldValue::from(f64::NAN), FieldValue::from(f64::NAN));
    assert_ne!(FieldValue::from(0.0_f64), FieldValue::from(-0.0_f64));
  }

  #[test]
  fn test_fingerprint_stable() {
    let a: FieldValue = FieldValue::from("rex");
    let b: FieldValue = FieldValue::from(String::from("rex"));

    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.fingerprint(), FieldValue::from("fido").fingerprint());
  }

  #[test]
  fn test_type_field() {
    let value: FieldValue = FieldValue::from(TypeName::new("field::Kind"));

    assert_eq!(value, FieldValue::Type(TypeName::new("field::Kind")));
  }
}
