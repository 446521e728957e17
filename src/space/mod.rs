//! The tuple space: entry storage, the type index and watcher matching.
//!
//! # Contents
//!
//! - [`Space`]: facade driving every other component
//! - [`TypeIndex`]: permanent subtype graph
//! - [`EntryCatalog`], [`EntryBucket`], [`EntryHandle`]: entry storage
//! - [`WatcherIndex`], [`TemplateBucket`], [`TemplateHandle`]: watcher
//!   registration and matching
//! - [`EntryTransition`]: a change in an entry's state
//! - [`Shuffler`]: seedable source of random permutations
//! - [`SpaceConfig`]: tunables

mod config;
mod engine;
mod entry;
mod shuffle;
mod transition;
mod type_index;
mod watch;

pub use self::config::SpaceConfig;
pub use self::engine::ReapStats;
pub use self::engine::Space;
pub use self::engine::StoredEntry;
pub use self::engine::Taken;
pub use self::engine::Written;
pub use self::entry::EntryBucket;
pub use self::entry::EntryCatalog;
pub use self::entry::EntryHandle;
pub use self::shuffle::Shuffler;
pub use self::transition::EntryTransition;
pub use self::transition::TransitionFlags;
pub use self::type_index::TypeIndex;
pub use self::watch::InterestSet;
pub use self::watch::TemplateBucket;
pub use self::watch::TemplateHandle;
pub use self::watch::TransitionWatcher;
pub use self::watch::WatcherId;
pub use self::watch::WatcherIndex;
pub use self::watch::WatcherKey;
pub use self::watch::WatcherReap;
