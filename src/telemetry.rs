//! Installation of the global `tracing` subscriber.
//!
//! Every event emitted by this crate uses the [`TRACING_TARGET`] target, so
//! an application that installs its own subscriber can filter on it.
//!
//! [`TRACING_TARGET`]: crate::consts::TRACING_TARGET

use std::fmt::Display;

use crate::error::Exception;
use crate::error::ExceptionClass;
use crate::error::ExceptionGroup;
use crate::space::SpaceConfig;

/// Installs a compact `fmt` subscriber configured from `config`.
///
/// # Errors
///
/// Returns a `SysInv` exception if a global subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: &SpaceConfig) -> Result<(), Exception> {
  use tracing_subscriber::FmtSubscriber;
  use tracing_subscriber::fmt::format;
  use tracing_subscriber::util::SubscriberInitExt;

  FmtSubscriber::builder()
    .event_format(format().compact())
    .log_internal_errors(true)
    .with_ansi(true)
    .with_file(config.tracing_source_file)
    .with_level(true)
    .with_line_number(config.tracing_source_line)
    .with_max_level(config.tracing_filter())
    .with_target(config.tracing_source_name)
    .with_thread_ids(config.tracing_thread_info)
    .with_thread_names(config.tracing_thread_info)
    .finish()
    .try_init()
    .map_err(error)
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: &SpaceConfig) -> Result<(), Exception> {
  Ok(())
}

/// Returns a generic `SysInv` exception with the given error message.
#[cold]
#[cfg_attr(not(feature = "tracing"), expect(dead_code))]
fn error<E>(error: E) -> Exception
where
  E: Display,
{
  Exception::new(ExceptionClass::Error, ExceptionGroup::SysInv, error)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(all(test, feature = "tracing"))]
mod tests {
  use crate::error::ExceptionGroup;
  use crate::space::SpaceConfig;
  use crate::telemetry::init_tracing;

  #[test]
  fn test_second_install_fails() {
    let config: SpaceConfig = SpaceConfig::new();

    // Only the first install in the process can succeed.
    let _ignore: Result<(), _> = init_tracing(&config);

    let error = init_tracing(&config).unwrap_err();

    assert_eq!(error.group(), ExceptionGroup::SysInv);
  }
}
