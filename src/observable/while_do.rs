use std::sync::Arc;

use crate::observable::{concat_iter, Observable};

/// Subscribes to `source` again and again for as long as `condition()`
/// holds, checking it before every pass.
pub fn while_do<T: Send + 'static>(
  condition: impl Fn() -> bool + Send + Sync + 'static, source: Observable<T>,
) -> Observable<T> {
  let condition = Arc::new(condition);
  concat_iter(move || {
    let (condition, source) = (condition.clone(), source.clone());
    std::iter::from_fn(move || condition().then(|| source.clone()))
  })
}

/// Like [`while_do`], but the first pass runs unconditionally.
pub fn do_while<T: Send + 'static>(
  condition: impl Fn() -> bool + Send + Sync + 'static, source: Observable<T>,
) -> Observable<T> {
  let condition = Arc::new(condition);
  concat_iter(move || {
    let (condition, source) = (condition.clone(), source.clone());
    std::iter::once(source.clone()).chain(std::iter::from_fn(move || condition().then(|| source.clone())))
  })
}
