//! Atomics used by the ordinal clock, swapped for loom's under `cfg(loom)`.

pub(crate) mod sync {
  pub(crate) mod atomic {
    #[cfg(loom)]
    pub(crate) use loom::sync::atomic::AtomicU64;
    #[cfg(loom)]
    pub(crate) use loom::sync::atomic::Ordering;

    #[cfg(not(loom))]
    pub(crate) use std::sync::atomic::AtomicU64;
    #[cfg(not(loom))]
    pub(crate) use std::sync::atomic::Ordering;
  }
}
