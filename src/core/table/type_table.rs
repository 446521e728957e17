//! Global interning table for entry type names.
//!
//! Type names are permanent: once a name has been seen it keeps its slot
//! for the lifetime of the process, which is exactly the lifetime of the
//! knowledge recorded about it in the [`TypeIndex`]. Names are compared by
//! slot, so the hot matching paths never touch string data.
//!
//! # Thread Safety
//!
//! Lookups of known names only take a read lock. Interning a new name
//! upgrades to a write lock for the duration of one append.
//!
//! # Memory Considerations
//!
//! Interned strings are **never deallocated**. The table is bounded by
//! [`MAX_TYPE_COUNT`] names of at most [`MAX_TYPE_NAME_BYTES`] bytes.
//!
//! [`TypeIndex`]: crate::space::TypeIndex

use hashbrown::HashMap;
use parking_lot::RwLock;
use parking_lot::RwLockReadGuard;
use parking_lot::RwLockUpgradableReadGuard;
use parking_lot::RwLockWriteGuard;
use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::consts::MAX_TYPE_COUNT;
use crate::consts::MAX_TYPE_NAME_BYTES;

// -----------------------------------------------------------------------------
// Type Table Error
// -----------------------------------------------------------------------------

/// Errors returned from type table lookup or insertion.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TypeTableError {
  /// The name exceeds [`MAX_TYPE_NAME_BYTES`].
  NameTooLarge,
  /// The table already holds [`MAX_TYPE_COUNT`] names.
  TooManyTypes,
  /// The requested slot has not been allocated.
  TypeNotFound,
}

impl Display for TypeTableError {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::NameTooLarge => f.write_str("type name too large"),
      Self::TooManyTypes => f.write_str("too many types"),
      Self::TypeNotFound => f.write_str("type not found"),
    }
  }
}

impl Error for TypeTableError {}

// -----------------------------------------------------------------------------
// Type Table
// -----------------------------------------------------------------------------

/// Thread-safe, append-only interning table for type names.
///
/// Names live in fixed-size blocks indexed by slot number; a hash map
/// translates names back to slots.
pub(crate) struct TypeTable {
  inner: RwLock<Table>,
}

impl TypeTable {
  /// Creates an empty table with its first block allocated.
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      inner: RwLock::new(Table::new()),
    }
  }

  /// Returns the number of interned names.
  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.inner.read().len
  }

  /// Returns the name stored at `slot`.
  ///
  /// # Errors
  ///
  /// Returns [`TypeTableError::TypeNotFound`] if `slot` was never allocated.
  pub(crate) fn lookup(&self, slot: u32) -> Result<&'static str, TypeTableError> {
    let guard: RwLockReadGuard<'_, Table> = self.inner.read();
    let index: usize = slot as usize;

    if index >= guard.len {
      return Err(TypeTableError::TypeNotFound);
    }

    Ok(guard.arr[index >> Block::BITS].inner[index & Block::MASK])
  }

  /// Returns the slot of `data`, if it has been interned.
  #[inline]
  pub(crate) fn find(&self, data: &str) -> Option<u32> {
    self.inner.read().map.get(data).copied()
  }

  /// Interns `data` and returns its slot.
  ///
  /// Known names return their existing slot under a shared lock; only new
  /// names take the write lock.
  ///
  /// # Errors
  ///
  /// Returns [`TypeTableError::NameTooLarge`] if `data` exceeds
  /// [`MAX_TYPE_NAME_BYTES`] and [`TypeTableError::TooManyTypes`] if the
  /// table is full.
  pub(crate) fn insert(&self, data: &str) -> Result<u32, TypeTableError> {
    // -------------------------------------------------------------------------
    // 1. Fast Path - Known Name
    // -------------------------------------------------------------------------

    let guard: RwLockUpgradableReadGuard<'_, Table> = self.inner.upgradable_read();

    if let Some(slot) = guard.map.get(data) {
      return Ok(*slot);
    }

    // -------------------------------------------------------------------------
    // 2. Slow Path - New Name
    // -------------------------------------------------------------------------

    if data.len() > MAX_TYPE_NAME_BYTES {
      return Err(TypeTableError::NameTooLarge);
    }

    let mut guard: RwLockWriteGuard<'_, Table> = RwLockUpgradableReadGuard::upgrade(guard);
    let len: usize = guard.len;

    if len >= MAX_TYPE_COUNT {
      return Err(TypeTableError::TooManyTypes);
    }

    if len >= guard.cap() {
      guard.arr.push(Box::new(Block::new()));
    }

    debug_assert!(guard.arr.len() == (len >> Block::BITS) + 1);

    let term: &'static str = Box::leak(Box::from(data));

    guard.arr[len >> Block::BITS].inner[len & Block::MASK] = term;
    guard.map.insert(term, len as u32);
    guard.len += 1;

    drop(guard);

    Ok(len as u32)
  }
}

impl Debug for TypeTable {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let guard: RwLockReadGuard<'_, Table> = self.inner.read();

    f.debug_struct("TypeTable")
      .field("size", &guard.len)
      .field("blocks", &guard.arr.len())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Type Table - Table
// -----------------------------------------------------------------------------

struct Table {
  map: HashMap<&'static str, u32>,
  arr: Vec<Box<Block>>,
  len: usize,
}

impl Table {
  /// Maximum number of blocks needed to store [`MAX_TYPE_COUNT`] names.
  const BLOCKS: usize = MAX_TYPE_COUNT.div_ceil(Block::SIZE);

  #[inline]
  fn new() -> Self {
    let mut this: Self = Self {
      map: HashMap::with_capacity(Block::SIZE),
      arr: Vec::with_capacity(Self::BLOCKS),
      len: 0,
    };

    this.arr.push(Box::new(Block::new()));
    this
  }

  #[inline]
  fn cap(&self) -> usize {
    self.arr.len() * Block::SIZE
  }
}

// -----------------------------------------------------------------------------
// Type Table - Block
// -----------------------------------------------------------------------------

struct Block {
  inner: [&'static str; Self::SIZE],
}

impl Block {
  /// Bit width for block-local slot indexing.
  const BITS: u32 = 10;

  /// Number of name slots per block.
  const SIZE: usize = 1 << Self::BITS;

  /// Bitmask for extracting the block-local slot index.
  const MASK: usize = Self::SIZE - 1;

  #[inline]
  const fn new() -> Self {
    Self {
      inner: [""; Self::SIZE],
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
