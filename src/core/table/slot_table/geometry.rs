use crossbeam_epoch::Atomic;
use crossbeam_utils::CachePadded;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::atomic::AtomicUsize;

// -----------------------------------------------------------------------------
// Geometry
// -----------------------------------------------------------------------------

/// Size and index-mapping parameters of one slot table.
///
/// Keys are handed out in sequential ("abstract") order but stored in a
/// striped ("concrete") order so that neighbouring keys land on different
/// cache lines:
///
/// ```text
/// ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌───────────┐
/// │ 0 4 8 12 │ │ 1 5 9 13 │ │ 2 6 10 14 │ │ 3 7 11 15 │
/// └──────────┘ └──────────┘ └───────────┘ └───────────┘
/// ```
#[derive(Clone, Copy, Debug)]
pub(crate) struct Geometry {
  pub(crate) blocks: NonZeroUsize,
  pub(crate) length: NonZeroUsize,
  mask_block: usize,
  mask_index: usize,
  shift_block: u32,
  shift_index: u32,
}

impl Geometry {
  /// The assumed size of a cache line in bytes.
  pub(crate) const CACHE_LINE: usize = size_of::<CachePadded<u8>>();

  /// The number of bytes required to store one slot.
  pub(crate) const SLOT_SIZE: usize = {
    assert!(
      size_of::<AtomicUsize>() == size_of::<Atomic<()>>(),
      "atomic pointer != atomic usize",
    );

    size_of::<Atomic<()>>()
  };

  /// The number of slots sharing one cache line.
  pub(crate) const LINE_SLOTS: usize = {
    assert!(
      Self::CACHE_LINE % Self::SLOT_SIZE == 0,
      "cache line must be divisible by slot size",
    );

    let count: usize = Self::CACHE_LINE / Self::SLOT_SIZE;

    assert!(count.is_power_of_two(), "slot count must be a power of two");

    count
  };

  pub(crate) const MIN_SHIFT: u32 = 4;
  pub(crate) const MAX_SHIFT: u32 = 24;
  pub(crate) const DEF_SHIFT: u32 = 10;

  pub(crate) const MIN_ENTRIES: NonZeroUsize = nonzero(1 << Self::MIN_SHIFT);
  pub(crate) const MAX_ENTRIES: NonZeroUsize = nonzero(1 << Self::MAX_SHIFT);
  pub(crate) const DEF_ENTRIES: NonZeroUsize = nonzero(1 << Self::DEF_SHIFT);

  /// Computes the geometry for a table of at least `capacity` slots.
  pub(crate) const fn new(capacity: usize) -> Self {
    let length: NonZeroUsize = clamp_capacity(capacity);
    let bytes: usize = (length.get() * Self::SLOT_SIZE).next_multiple_of(Self::CACHE_LINE);
    let blocks: NonZeroUsize = nonzero(bytes / Self::CACHE_LINE);

    let mask_block: usize = blocks.get() - 1;
    let mask_index: usize = Self::LINE_SLOTS - 1;

    Self {
      blocks,
      length,
      mask_block,
      mask_index,
      shift_block: mask_index.trailing_ones(),
      shift_index: mask_block.trailing_ones(),
    }
  }

  /// Maps an abstract (sequential) position onto its concrete slot.
  ///
  /// Only the low `log2(length)` bits of `position` participate, so serial
  /// bits above them are ignored.
  #[inline]
  pub(crate) const fn to_concrete(&self, position: usize) -> SlotIndex<'_> {
    let mut value: usize = (position & self.mask_block) << self.shift_block;
    value += (position >> self.shift_index) & self.mask_index;
    SlotIndex::new(self, value)
  }

  /// Returns the abstract position initially parked at concrete `index`.
  #[inline]
  pub(crate) const fn initial_position(&self, index: usize) -> usize {
    let block: usize = index >> self.shift_block;
    let local: usize = index & self.mask_index;
    local * self.blocks.get() + block
  }
}

// -----------------------------------------------------------------------------
// Slot Index
// -----------------------------------------------------------------------------

/// A concrete slot index known to be in bounds for the table it came from.
#[repr(transparent)]
pub(crate) struct SlotIndex<'table> {
  source: usize,
  marker: PhantomData<&'table Geometry>,
}

impl SlotIndex<'_> {
  #[inline]
  const fn new(geometry: &Geometry, source: usize) -> Self {
    debug_assert!(
      source < geometry.length.get(),
      "SlotIndex::new requires that the index is in bounds",
    );

    Self {
      source,
      marker: PhantomData,
    }
  }

  #[inline]
  pub(crate) const fn get(&self) -> usize {
    self.source
  }
}

#[inline]
const fn clamp_capacity(capacity: usize) -> NonZeroUsize {
  let Some(capacity) = capacity.checked_next_power_of_two() else {
    return Geometry::MAX_ENTRIES;
  };

  if capacity < Geometry::MIN_ENTRIES.get() {
    Geometry::MIN_ENTRIES
  } else if capacity > Geometry::MAX_ENTRIES.get() {
    Geometry::MAX_ENTRIES
  } else {
    nonzero(capacity)
  }
}

#[inline]
const fn nonzero(value: usize) -> NonZeroUsize {
  match NonZeroUsize::new(value) {
    Some(value) => value,
    None => panic!("nonzero value"),
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn test_length_clamped() {
    assert_eq!(Geometry::new(0).length, Geometry::MIN_ENTRIES);
    assert_eq!(Geometry::new(1).length, Geometry::MIN_ENTRIES);
    assert_eq!(Geometry::new(100).length.get(), 128);
    assert_eq!(Geometry::new(256).length.get(), 256);
    assert_eq!(Geometry::new(usize::MAX).length, Geometry::MAX_ENTRIES);
  }

  #[test]
  fn test_blocks_cover_length() {
    for shift in Geometry::MIN_SHIFT..=Geometry::MAX_SHIFT {
      let geometry: Geometry = Geometry::new(1 << shift);

      assert_eq!(geometry.blocks.get() * Geometry::LINE_SLOTS, geometry.length.get());
      assert!(geometry.blocks.is_power_of_two());
    }
  }

  #[test]
  fn test_to_concrete_is_a_permutation() {
    for shift in Geometry::MIN_SHIFT..=16 {
      let geometry: Geometry = Geometry::new(1 << shift);
      let mut seen: HashSet<usize> = HashSet::with_capacity(1 << shift);

      for position in 0..geometry.length.get() {
        seen.insert(geometry.to_concrete(position).get());
      }

      assert_eq!(seen.len(), geometry.length.get());
    }
  }

  #[test]
  fn test_to_concrete_ignores_serial() {
    let geometry: Geometry = Geometry::new(1 << 10);
    let length: usize = geometry.length.get();

    for position in 0..length {
      let base: usize = geometry.to_concrete(position).get();

      for serial in 1..8 {
        assert_eq!(geometry.to_concrete(position + serial * length).get(), base);
      }
    }
  }

  #[test]
  fn test_initial_position_inverts_to_concrete() {
    for shift in Geometry::MIN_SHIFT..=16 {
      let geometry: Geometry = Geometry::new(1 << shift);

      for index in 0..geometry.length.get() {
        let position: usize = geometry.initial_position(index);

        assert_eq!(geometry.to_concrete(position).get(), index);
      }
    }
  }

  #[test]
  fn test_neighbours_spread_across_lines() {
    let geometry: Geometry = Geometry::new(1 << 10);
    let mut lines: HashSet<usize> = HashSet::new();

    for position in 0..Geometry::LINE_SLOTS {
      lines.insert(geometry.to_concrete(position).get() / Geometry::LINE_SLOTS);
    }

    assert_eq!(lines.len(), Geometry::LINE_SLOTS);
  }
}
