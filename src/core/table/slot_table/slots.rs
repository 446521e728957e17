use std::alloc::Layout;
use std::alloc::alloc;
use std::alloc::dealloc;
use std::alloc::handle_alloc_error;
use std::mem::ManuallyDrop;
use std::mem::MaybeUninit;
use std::num::NonZeroUsize;
use std::ptr::NonNull;
use std::slice;

use crate::core::table::slot_table::Geometry;
use crate::core::table::slot_table::SlotIndex;
use crate::error::fatal;

/// Fixed-length, cache-line-aligned heap array.
pub(crate) struct SlotArray<T> {
  ptr: NonNull<T>,
  len: NonZeroUsize,
}

impl<T> SlotArray<T> {
  /// Allocates an array of `len` uninitialized elements.
  pub(crate) fn new_uninit(len: NonZeroUsize) -> SlotArray<MaybeUninit<T>> {
    let layout: Layout = Self::layout(len);

    // SAFETY: `layout` has a non-zero size.
    let target: *mut u8 = unsafe { alloc(layout) };

    let Some(nonnull) = NonNull::new(target) else {
      handle_alloc_error(layout);
    };

    SlotArray {
      ptr: nonnull.cast(),
      len,
    }
  }

  /// Allocates an array with every element produced by `init(index)`.
  pub(crate) fn from_fn<F>(len: NonZeroUsize, mut init: F) -> Self
  where
    F: FnMut(usize) -> T,
  {
    let mut data: SlotArray<MaybeUninit<T>> = Self::new_uninit(len);

    for (index, item) in data.as_mut_slice().iter_mut().enumerate() {
      item.write(init(index));
    }

    // SAFETY: Every element was written above.
    unsafe { data.assume_init() }
  }

  #[inline]
  pub(crate) const fn as_ptr(&self) -> *const T {
    self.ptr.as_ptr()
  }

  #[inline]
  pub(crate) const fn as_slice(&self) -> &[T] {
    // SAFETY: `ptr` points to `len` initialized elements.
    unsafe { slice::from_raw_parts(self.as_ptr(), self.len.get()) }
  }

  #[inline]
  pub(crate) const fn as_mut_slice(&mut self) -> &mut [T] {
    // SAFETY: `ptr` points to `len` elements and we hold `&mut self`.
    unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len.get()) }
  }

  /// Returns the element at a concrete index.
  #[inline]
  pub(crate) const fn get(&self, index: SlotIndex<'_>) -> &T {
    debug_assert!(
      index.get() < self.len.get(),
      "SlotArray::get requires that the index is in bounds",
    );

    // SAFETY: `SlotIndex` values are produced in bounds by `Geometry`.
    unsafe { self.ptr.add(index.get()).as_ref() }
  }

  fn layout(len: NonZeroUsize) -> Layout {
    let Some(bytes) = len.get().checked_mul(size_of::<T>()) else {
      fatal!("slot array size overflow");
    };

    match Layout::from_size_align(bytes.next_multiple_of(Geometry::CACHE_LINE), Geometry::CACHE_LINE) {
      Ok(layout) if layout.size() != 0 => layout,
      Ok(_) => fatal!("zero-sized slot array"),
      Err(error) => fatal!(error),
    }
  }
}

impl<T> SlotArray<MaybeUninit<T>> {
  /// Converts `self` into an initialized array.
  ///
  /// # Safety
  ///
  /// Every element must have been initialized.
  #[inline]
  pub(crate) unsafe fn assume_init(self) -> SlotArray<T> {
    let len: NonZeroUsize = self.len;
    let ptr: NonNull<T> = ManuallyDrop::new(self).ptr.cast();

    SlotArray { ptr, len }
  }
}

impl<T> Drop for SlotArray<T> {
  fn drop(&mut self) {
    // Elements are atomics or raw pointers owned by the table; the table
    // drops what they point to before the array itself goes away.
    let target: *mut u8 = self.ptr.as_ptr().cast();
    let layout: Layout = Self::layout(self.len);

    // SAFETY: Allocated in `new_uninit` with this exact layout.
    unsafe { dealloc(target, layout) }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::num::NonZeroUsize;
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;

  use crate::core::table::slot_table::Geometry;
  use crate::core::table::slot_table::SlotArray;

  #[test]
  fn test_alignment() {
    for shift in Geometry::MIN_SHIFT..=16 {
      let len: NonZeroUsize = NonZeroUsize::new(1 << shift).unwrap();
      let array: SlotArray<AtomicUsize> = SlotArray::from_fn(len, AtomicUsize::new);

      assert_eq!(array.as_ptr().addr() % Geometry::CACHE_LINE, 0);
      assert_eq!(array.as_slice().len(), len.get());
    }
  }

  #[test]
  fn test_from_fn_initializes_every_element() {
    let len: NonZeroUsize = NonZeroUsize::new(64).unwrap();
    let array: SlotArray<AtomicUsize> = SlotArray::from_fn(len, |index| AtomicUsize::new(index * 2));

    for (index, item) in array.as_slice().iter().enumerate() {
      assert_eq!(item.load(Ordering::Relaxed), index * 2);
    }
  }
}
