//! Exception handling and error types for the matching engine.
//!
//! The steady-state matching path never fails: lookups that find nothing
//! return `None` or an empty set. The failures that remain are expressed
//! as exceptions rather than `Result`s:
//!
//! 1. **Capacity exhaustion** ([`SysCap`]): the type table or a bucket has
//!    run out of room. This is an operational limit, not a usage error.
//! 2. **Bad arguments** ([`BadArg`]): a template handed to a write.
//! 3. **Broken invariants** ([`SysInv`]): an internal bug. These abort via
//!    the crate-internal `fatal!` macro.
//!
//! Usage errors detected while *building* records are ordinary `Result`
//! values (see [`RecordError`]).
//!
//! # Raising Exceptions
//!
//! ```
//! use tuplex::raise;
//!
//! fn reserve(count: usize, limit: usize) {
//!   if count > limit {
//!     raise!(Error, SysCap, "too many entries");
//!   }
//! }
//! ```
//!
//! [`BadArg`]: ExceptionGroup::BadArg
//! [`SysCap`]: ExceptionGroup::SysCap
//! [`SysInv`]: ExceptionGroup::SysInv
//! [`RecordError`]: crate::core::RecordError

mod exception;
mod exception_class;
mod exception_group;

pub use self::exception::Exception;
pub use self::exception_class::ExceptionClass;
pub use self::exception_group::ExceptionGroup;

// -----------------------------------------------------------------------------
// raise!
// -----------------------------------------------------------------------------

/// Raises an exception with the specified class, group, and message.
///
/// This macro constructs an [`Exception`] and immediately panics with it.
///
/// # Examples
///
/// ```
/// # use tuplex::raise;
/// fn intern(name: &str) {
///   if name.len() > 1024 {
///     raise!(Error, SysCap, "type name too large");
///   }
/// }
/// ```
#[macro_export]
macro_rules! raise {
  ($class:ident, $group:ident, $error:expr $(,)?) => {
    ::std::panic!(
      "{}",
      $crate::error::Exception::new(
        $crate::error::ExceptionClass::$class,
        $crate::error::ExceptionGroup::$group,
        $error,
      ),
    )
  };
}

// -----------------------------------------------------------------------------
// fatal!
// -----------------------------------------------------------------------------

/// Displays a system invariant violation and aborts the process.
///
/// Reserved for states that can only be reached through a bug in this
/// crate; no unwinding takes place.
macro_rules! fatal {
  ($error:expr) => {{
    ::std::eprintln!(
      "{}:{}: (SysInv) a system invariant has been broken: {}",
      ::std::file!(),
      ::std::line!(),
      $error,
    );

    ::std::process::abort();
  }};
}

pub(crate) use fatal;

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
