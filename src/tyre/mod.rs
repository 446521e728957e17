//! Concurrent building blocks with no dependency on the space itself.

mod append_set;

pub use self::append_set::AppendSet;
