mod error;
mod geometry;
mod key;
mod slots;
mod state;
mod table;

pub(crate) use self::error::SlotAccessError;

pub(crate) use self::geometry::Geometry;
pub(crate) use self::geometry::SlotIndex;

pub use self::key::SlotKey;

pub(crate) use self::slots::SlotArray;

pub(crate) use self::state::Cell;
pub(crate) use self::state::ReadOnly;
pub(crate) use self::state::Volatile;

pub(crate) use self::table::Permit;
pub(crate) use self::table::SlotTable;
