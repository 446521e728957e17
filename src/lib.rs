//! Tuplex - a concurrent entry store and transition-matching engine for
//! tuple spaces.
//!
//! Entries are immutable typed records. Templates are records whose
//! fields may be wildcards; a template matches every entry of its type or
//! of any subtype whose non-wildcard fields are equal. Watchers register
//! against templates and are told which entry transitions concern them.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc as StdArc;
//! use triomphe::Arc;
//! use tuplex::core::{EntryRecord, Ordinal, Timestamp, TypeName};
//! use tuplex::space::{EntryTransition, Space, TransitionWatcher};
//!
//! struct Printer;
//!
//! impl TransitionWatcher for Printer {
//!   fn expiration(&self) -> Timestamp {
//!     Timestamp::FOREVER
//!   }
//!
//!   fn is_interested(&self, transition: &EntryTransition, _: Ordinal) -> bool {
//!     transition.is_new_entry()
//!   }
//! }
//!
//! let space = Space::default();
//! let animals = EntryRecord::any_of(TypeName::new("Animal"));
//! let key = space.register(StdArc::new(Printer), Arc::new(animals));
//!
//! let dog = EntryRecord::builder(TypeName::new("Dog"))
//!   .extends(TypeName::new("Animal"))
//!   .field("rex")
//!   .entry()
//!   .unwrap();
//!
//! let written = space.write(Arc::new(dog), Timestamp::FOREVER);
//!
//! assert!(written.interested.contains(key.id()));
//! ```
//!
//! # Core Modules
//!
//! - [`space`]: The space facade and its indexes
//! - [`core`]: Value types and lock-free tables
//! - [`tyre`]: Lock-free collections
//! - [`error`]: Exception system
//! - [`telemetry`]: Tracing subscriber installation
//! - [`consts`]: Limits and default tunables

mod loom;
mod utils;

pub mod consts;
pub mod core;
pub mod error;
pub mod space;
pub mod telemetry;
pub mod tyre;
