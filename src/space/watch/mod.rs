//! Watcher registration and transition matching.

mod bucket;
mod index;
mod interest;
mod template;
mod watcher;

pub use self::bucket::TemplateBucket;
pub use self::index::WatcherIndex;
pub use self::index::WatcherReap;
pub use self::interest::InterestSet;
pub use self::template::TemplateHandle;
pub use self::watcher::TransitionWatcher;
pub use self::watcher::WatcherId;
pub use self::watcher::WatcherKey;

pub(crate) use self::watcher::WatcherEntry;
