//! Buffers are windows collected into vectors.
use std::time::Duration;

use crate::{observable::Observable, scheduler::SchedulerRef};

impl<T: Clone + Send + Sync + 'static> Observable<T> {
  /// Emits the values gathered since the previous boundary on every value
  /// of `boundaries`, possibly an empty vector, and the pending values
  /// once either side terminates.
  pub fn buffer<B: Send + 'static>(&self, boundaries: Observable<B>) -> Observable<Vec<T>> {
    self.window(boundaries).flat_map(|w| w.to_list())
  }

  /// Vectors of `count` values, a new one starting every `skip` values
  /// (default `count`). On completion the pending non-empty vectors are
  /// emitted.
  pub fn buffer_with_count(&self, count: usize, skip: Option<usize>) -> Observable<Vec<T>> {
    self.window_with_count(count, skip).flat_map(|w| w.to_list()).filter(|b| !b.is_empty())
  }

  /// Vectors of the values received during each time window; see
  /// [`window_with_time`](Self::window_with_time).
  pub fn buffer_with_time(&self, span: Duration, shift: Option<Duration>) -> Observable<Vec<T>> {
    self.window_with_time(span, shift).flat_map(|w| w.to_list())
  }

  pub fn buffer_with_time_on(
    &self, span: Duration, shift: Option<Duration>, scheduler: Option<SchedulerRef>,
  ) -> Observable<Vec<T>> {
    self.window_with_time_on(span, shift, scheduler).flat_map(|w| w.to_list())
  }

  /// Vectors closed after `span` or at `count` values, whichever comes
  /// first; see [`window_with_time_or_count`](Self::window_with_time_or_count).
  pub fn buffer_with_time_or_count(&self, span: Duration, count: usize) -> Observable<Vec<T>> {
    self.window_with_time_or_count(span, count).flat_map(|w| w.to_list())
  }

  pub fn buffer_with_time_or_count_on(
    &self, span: Duration, count: usize, scheduler: Option<SchedulerRef>,
  ) -> Observable<Vec<T>> {
    self.window_with_time_or_count_on(span, count, scheduler).flat_map(|w| w.to_list())
  }
}
