//! Core value types and lock-free storage tables.

mod table;
mod types;

pub(crate) use self::table::Bucket;
pub(crate) use self::table::SlotTable;
pub(crate) use self::table::TypeTable;

pub use self::table::BucketKey;
pub use self::table::SlotKey;
pub use self::table::TypeTableError;

pub use self::types::EntryCookie;
pub use self::types::EntryRecord;
pub use self::types::EntryRecordBuilder;
pub use self::types::FieldValue;
pub use self::types::MatchDescriptor;
pub use self::types::Ordinal;
pub use self::types::OrdinalClock;
pub use self::types::RecordError;
pub use self::types::Timestamp;
pub use self::types::TypeName;

pub(crate) use self::types::DescriptorCache;
