use std::{collections::HashMap, hash::Hash, sync::Arc};

use crate::{
  error::RxError,
  observable::{empty, try_defer, Observable},
};

/// Subscribes to the source registered under `selector()`'s key, chosen
/// anew on every subscription. Falls back to `default`, or to an empty
/// sequence when there is no default.
pub fn case<K, T>(
  selector: impl Fn() -> K + Send + Sync + 'static, sources: HashMap<K, Observable<T>>,
  default: Option<Observable<T>>,
) -> Observable<T>
where
  K: Eq + Hash + Send + Sync + 'static,
  T: Send + 'static,
{
  try_case(move || Ok(selector()), sources, default)
}

/// Like [`case`]; an `Err` from the selector becomes the error of the
/// subscription.
pub fn try_case<K, T>(
  selector: impl Fn() -> Result<K, RxError> + Send + Sync + 'static, sources: HashMap<K, Observable<T>>,
  default: Option<Observable<T>>,
) -> Observable<T>
where
  K: Eq + Hash + Send + Sync + 'static,
  T: Send + 'static,
{
  let sources = Arc::new(sources);
  try_defer(move || {
    let key = selector()?;
    Ok(sources.get(&key).cloned().or_else(|| default.clone()).unwrap_or_else(empty))
  })
}

/// `then` when `condition()` holds at subscription, otherwise `otherwise`
/// (empty when `None`).
pub fn if_then<T: Send + 'static>(
  condition: impl Fn() -> bool + Send + Sync + 'static, then: Observable<T>,
  otherwise: Option<Observable<T>>,
) -> Observable<T> {
  let sources = HashMap::from([(true, then)]);
  case(condition, sources, otherwise)
}
