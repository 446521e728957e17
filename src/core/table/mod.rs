//! Global tables for type names and lock-free slot storage.

mod bucket;
mod slot_table;
mod type_table;

pub(crate) use self::bucket::Bucket;
pub use self::bucket::BucketKey;

pub use self::slot_table::SlotKey;
pub(crate) use self::slot_table::Permit;
pub(crate) use self::slot_table::SlotTable;

pub(crate) use self::type_table::TypeTable;
pub use self::type_table::TypeTableError;
