use crate::core::SlotTable;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Maximum number of bytes in a [`TypeName`].
///
/// [`TypeName`]: crate::core::TypeName
pub const MAX_TYPE_NAME_BYTES: usize = 1024;

/// Maximum number of distinct [`TypeName`]s in the type table.
///
/// [`TypeName`]: crate::core::TypeName
pub const MAX_TYPE_COUNT: usize = 1 << 20;

// -----------------------------------------------------------------------------
// Matching
// -----------------------------------------------------------------------------

/// Minimum number of hash bits assigned to a single field.
///
/// Records with more than `64 / MIN_FIELD_HASH_BITS` fields only hash
/// their leading fields.
pub const MIN_FIELD_HASH_BITS: u32 = 4;

/// Number of distinct hash layouts; every field count at or above
/// `64 / MIN_FIELD_HASH_BITS` shares the last one.
pub const HASH_LAYOUTS: usize = (u64::BITS / MIN_FIELD_HASH_BITS) as usize + 1;

// -----------------------------------------------------------------------------
// Storage
// -----------------------------------------------------------------------------

/// Number of growable segments backing one bucket.
pub const BUCKET_SEGMENTS: usize = 24;

/// Default slot count of the first segment of an entry bucket.
pub const DEFAULT_BUCKET_CAPACITY: usize = SlotTable::<()>::DEF_ENTRIES;

/// Default slot count of the first segment of a template bucket.
pub const DEFAULT_TEMPLATE_CAPACITY: usize = SlotTable::<()>::MIN_ENTRIES * 4;

/// Default slot count of the first segment of a template's watcher set.
pub const DEFAULT_WATCHER_CAPACITY: usize = SlotTable::<()>::MIN_ENTRIES;

// -----------------------------------------------------------------------------
// Logging
// -----------------------------------------------------------------------------

/// Target used by every `tracing` event emitted from this crate.
pub const TRACING_TARGET: &str = "tuplex";
