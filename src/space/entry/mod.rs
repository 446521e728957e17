//! Entry storage: one bucket per exact type plus a cookie index.

mod bucket;
mod catalog;
mod handle;

pub use self::bucket::EntryBucket;
pub use self::catalog::EntryCatalog;
pub use self::handle::EntryHandle;
