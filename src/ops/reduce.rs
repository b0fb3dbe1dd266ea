use crate::{error::RxError, observable::Observable};

impl<T: Send + 'static> Observable<T> {
  /// Folds the source from `seed`, emitting only the final accumulation
  /// when the source completes. An empty source yields `seed`.
  pub fn reduce_initial<A>(&self, seed: A, f: impl Fn(A, T) -> A + Send + Sync + 'static) -> Observable<A>
  where
    A: Clone + Send + Sync + 'static,
  {
    self.try_reduce_initial(seed, move |acc, v| Ok(f(acc, v)))
  }

  pub fn try_reduce_initial<A>(
    &self, seed: A, f: impl Fn(A, T) -> Result<A, RxError> + Send + Sync + 'static,
  ) -> Observable<A>
  where
    A: Clone + Send + Sync + 'static,
  {
    self.try_scan_initial(seed.clone(), f).last_or(Some(seed))
  }

  /// Folds the source using its first value as the seed. An empty source
  /// errors with [`RxError::SequenceContainsNoElements`].
  pub fn reduce(&self, f: impl Fn(T, T) -> T + Send + Sync + 'static) -> Observable<T>
  where
    T: Clone + Sync,
  {
    self.try_reduce(move |acc, v| Ok(f(acc, v)))
  }

  pub fn try_reduce(&self, f: impl Fn(T, T) -> Result<T, RxError> + Send + Sync + 'static) -> Observable<T>
  where
    T: Clone + Sync,
  {
    self.try_scan(f).last_or(None)
  }
}
