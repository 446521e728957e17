//! Value types shared by every part of the space.
//!
//! - [`TypeName`]: interned type name, with [`TypeName::ROOT`] as the
//!   universal ancestor
//! - [`FieldValue`]: the value of one entry field
//! - [`EntryRecord`]: immutable entry or template, built with
//!   [`EntryRecordBuilder`]
//! - [`EntryCookie`]: opaque 128-bit entry identifier
//! - [`Timestamp`]: lease deadline
//! - [`Ordinal`] and [`OrdinalClock`]: transition ordering

mod cookie;
mod field;
mod ordinal;
mod record;
mod time;
mod type_name;

pub use self::cookie::EntryCookie;
pub use self::field::FieldValue;
pub use self::ordinal::Ordinal;
pub use self::ordinal::OrdinalClock;
pub use self::record::EntryRecord;
pub use self::record::EntryRecordBuilder;
pub use self::record::MatchDescriptor;
pub use self::record::RecordError;
pub use self::time::Timestamp;
pub use self::type_name::TypeName;

pub(crate) use self::record::DescriptorCache;
