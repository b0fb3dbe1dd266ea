use crate::{
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::{trampoline_or, SchedulerRef},
  subscription::Subscription,
};

struct OfOp<T>(T);

/// Emits `value` and then completes, both from one task scheduled at
/// subscription. Without a scheduler this happens inside `subscribe`.
pub fn of<T: Clone + Send + Sync + 'static>(value: T) -> Observable<T> { Observable::new(OfOp(value)) }

/// Alias of [`of`].
pub fn just<T: Clone + Send + Sync + 'static>(value: T) -> Observable<T> { of(value) }

/// Alias of [`of`].
pub fn return_value<T: Clone + Send + Sync + 'static>(value: T) -> Observable<T> { of(value) }

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for OfOp<T> {
  fn actual_subscribe(
    &self, mut observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let value = self.0.clone();
    trampoline_or(&scheduler).schedule(Box::new(move || {
      observer.next(value);
      observer.complete();
    }))
  }
}
