use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Error returned when a key does not name a live slot.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub(crate) struct SlotAccessError;

impl Display for SlotAccessError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    f.write_str("invalid slot access")
  }
}

impl Error for SlotAccessError {}
