use crate::consts;

// -----------------------------------------------------------------------------
// Space Config
// -----------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct SpaceConfig {
  // ---------------------------------------------------------------------------
  // Storage Configuration
  // ---------------------------------------------------------------------------
  pub bucket_capacity: usize,
  pub template_capacity: usize,
  pub watcher_capacity: usize,
  // ---------------------------------------------------------------------------
  // Matching Configuration
  // ---------------------------------------------------------------------------
  pub shuffle_seed: Option<u64>,
  // ---------------------------------------------------------------------------
  // Tracing Subscriber Configuration
  // ---------------------------------------------------------------------------
  pub tracing_source_file: bool,
  pub tracing_source_line: bool,
  pub tracing_source_name: bool,
  pub tracing_thread_info: bool,
  pub tracing_verbose: bool,
  pub tracing_very_verbose: bool,
}

impl SpaceConfig {
  #[inline]
  pub fn new() -> Self {
    Self {
      bucket_capacity: consts::DEFAULT_BUCKET_CAPACITY,
      template_capacity: consts::DEFAULT_TEMPLATE_CAPACITY,
      watcher_capacity: consts::DEFAULT_WATCHER_CAPACITY,
      shuffle_seed: None,
      tracing_source_file: false,
      tracing_source_line: false,
      tracing_source_name: false,
      tracing_thread_info: true,
      tracing_verbose: true,
      tracing_very_verbose: false,
    }
  }

  #[inline]
  pub const fn tracing_filter(&self) -> tracing::Level {
    if self.tracing_very_verbose {
      tracing::Level::TRACE
    } else if self.tracing_verbose {
      tracing::Level::DEBUG
    } else {
      tracing::Level::INFO
    }
  }
}

impl Default for SpaceConfig {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
