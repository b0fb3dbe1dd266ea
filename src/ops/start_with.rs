use crate::observable::{concat, from_iter, Observable};

impl<T: Clone + Send + Sync + 'static> Observable<T> {
  /// Emits `values` before the values of the source.
  pub fn start_with(&self, values: Vec<T>) -> Observable<T> { concat(vec![from_iter(values), self.clone()]) }
}
