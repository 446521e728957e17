use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tracing::trace;
use triomphe::Arc;

use crate::consts::TRACING_TARGET;
use crate::core::Bucket;
use crate::core::BucketKey;
use crate::core::EntryRecord;
use crate::core::TypeName;
use crate::space::TemplateHandle;

/// Distinct templates of one exact type.
pub struct TemplateBucket {
  type_name: TypeName,
  handles: Bucket<Arc<TemplateHandle>>,
  watcher_capacity: usize,
}

impl TemplateBucket {
  pub fn new(type_name: TypeName, template_capacity: usize, watcher_capacity: usize) -> Self {
    Self {
      type_name,
      handles: Bucket::new(template_capacity),
      watcher_capacity,
    }
  }

  #[inline]
  pub fn type_name(&self) -> TypeName {
    self.type_name
  }

  /// Returns the number of template handles.
  #[inline]
  pub fn len(&self) -> usize {
    self.handles.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.handles.is_empty()
  }

  /// Returns the number of watchers across every handle.
  pub fn watcher_count(&self) -> usize {
    let mut count: usize = 0;
    self.handles.for_each(|_, handle| count += handle.len());
    count
  }

  /// Finds a live handle whose template is field-equal to `template`.
  pub fn find_equal(&self, template: &EntryRecord) -> Option<(BucketKey, Arc<TemplateHandle>)> {
    self.handles.find_map(|key, handle| {
      if handle.template().is_field_equal(template) && !handle.is_retired() {
        Some((key, Arc::clone(handle)))
      } else {
        None
      }
    })
  }

  /// Adds a new, empty handle for `template`.
  pub fn insert(&self, template: Arc<EntryRecord>) -> (BucketKey, Arc<TemplateHandle>) {
    debug_assert!(
      template.type_name() == self.type_name,
      "TemplateBucket::insert requires a template of the bucket type",
    );

    let handle: Arc<TemplateHandle> = Arc::new(TemplateHandle::new(template, self.watcher_capacity));
    let key: BucketKey = self.handles.insert(Arc::clone(&handle));

    trace!(target: TRACING_TARGET, type_name = %self.type_name, %key, "new template");

    (key, handle)
  }

  /// Returns the handle at `key`, if still present.
  #[inline]
  pub fn handle(&self, key: BucketKey) -> Option<Arc<TemplateHandle>> {
    self.handles.with(key, Arc::clone)
  }

  /// Unlinks the handle at `key`; `false` if it was already gone.
  #[inline]
  pub fn remove(&self, key: BucketKey) -> bool {
    self.handles.remove(key)
  }

  pub fn for_each<F>(&self, mut f: F)
  where
    F: FnMut(BucketKey, &Arc<TemplateHandle>),
  {
    self.handles.for_each(|key, handle| f(key, handle));
  }

  /// Snapshot of every handle with its location.
  pub fn to_vec(&self) -> Vec<(BucketKey, Arc<TemplateHandle>)> {
    let mut output: Vec<(BucketKey, Arc<TemplateHandle>)> = Vec::with_capacity(self.len());
    self.for_each(|key, handle| output.push((key, Arc::clone(handle))));
    output
  }
}

impl Debug for TemplateBucket {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TemplateBucket")
      .field("type_name", &self.type_name)
      .field("handles", &self.handles)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use triomphe::Arc;

  use crate::core::BucketKey;
  use crate::core::EntryRecord;
  use crate::core::TypeName;
  use crate::space::TemplateBucket;
  use crate::space::TemplateHandle;

  fn ty() -> TypeName {
    TypeName::new("template_bucket::Dog")
  }

  fn template(name: &str) -> Arc<EntryRecord> {
    Arc::new(EntryRecord::builder(ty()).field(name).template().unwrap())
  }

  #[test]
  fn test_find_equal() {
    let bucket: TemplateBucket = TemplateBucket::new(ty(), 16, 16);
    let (key, _) = bucket.insert(template("rex"));

    let found: Option<(BucketKey, Arc<TemplateHandle>)> = bucket.find_equal(&template("rex"));

    assert_eq!(found.map(|(key, _)| key), Some(key));
    assert!(bucket.find_equal(&template("fido")).is_none());
  }

  #[test]
  fn test_retired_handles_are_skipped() {
    let bucket: TemplateBucket = TemplateBucket::new(ty(), 16, 16);
    let (key, handle) = bucket.insert(template("rex"));

    assert!(handle.try_retire());
    assert!(bucket.find_equal(&template("rex")).is_none());
    assert!(bucket.remove(key));
    assert!(bucket.handle(key).is_none());
    assert!(bucket.is_empty());
  }
}
