use std::sync::Arc;

use super::{warn_disposed, SubjectCore};
use crate::{
  error::RxError,
  notification::Notification,
  observable::{CoreObservable, Observable, SubjectLike},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

/// A plain multicast subject. Late subscribers only see what is pushed
/// after they subscribed; after termination they get the terminal
/// notification right away.
pub struct Subject<T> {
  core: Arc<SubjectCore<T>>,
}

impl<T> Clone for Subject<T> {
  fn clone(&self) -> Self { Subject { core: self.core.clone() } }
}

impl<T> Default for Subject<T> {
  fn default() -> Self { Subject { core: Arc::default() } }
}

impl<T: Clone + Send + Sync + 'static> Subject<T> {
  pub fn new() -> Self { Self::default() }

  pub fn try_next(&self, value: T) -> Result<(), RxError> { self.push(Notification::Next(value)) }

  pub fn try_error(&self, err: RxError) -> Result<(), RxError> { self.push(Notification::Error(err)) }

  pub fn try_complete(&self) -> Result<(), RxError> { self.push(Notification::Complete) }

  fn push(&self, item: Notification<T>) -> Result<(), RxError> {
    self.core.serialize(item, |item| self.core.publish(item))
  }

  /// Subscribes `observer`, failing with [`RxError::Disposed`] after
  /// [`dispose`](Self::dispose).
  pub fn try_subscribe(&self, observer: impl Observer<T> + 'static) -> Result<Subscription, RxError> {
    self.core.subscribe(Box::new(observer), |_, _| {}).map_err(|_| RxError::Disposed)
  }

  /// Drops every subscriber; the subject is unusable afterwards.
  pub fn dispose(&self) { self.core.dispose() }

  pub fn is_disposed(&self) -> bool { self.core.is_disposed() }

  pub fn is_stopped(&self) -> bool { self.core.is_stopped() }

  pub fn observer_count(&self) -> usize { self.core.observer_count() }

  pub fn has_observers(&self) -> bool { self.observer_count() > 0 }

  pub fn as_observable(&self) -> Observable<T> { Observable::new(self.clone()) }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for Subject<T> {
  fn next(&mut self, value: T) { warn_disposed(self.try_next(value)) }

  fn error(&mut self, err: RxError) { warn_disposed(self.try_error(err)) }

  fn complete(&mut self) { warn_disposed(self.try_complete()) }

  fn is_closed(&self) -> bool { self.core.is_stopped() || self.core.is_disposed() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for Subject<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, _: Option<SchedulerRef>) -> Subscription {
    self.core.subscribe_or_error(observer, |_, _| {})
  }
}

impl<T: Clone + Send + Sync + 'static> SubjectLike<T> for Subject<T> {
  fn as_observer(&self) -> BoxedObserver<T> { Box::new(self.clone()) }

  fn as_observable(&self) -> Observable<T> { Subject::as_observable(self) }
}

#[cfg(test)]
mod tests {
  use parking_lot::Mutex;

  use super::*;
  use crate::testing::{ReactiveTest, TestScheduler};

  #[rxkit_macro::test]
  fn hot_semantics() {
    let scheduler = TestScheduler::new();
    let subject = Subject::new();
    let first = scheduler.create_observer::<i32>();
    let second = scheduler.create_observer::<i32>();

    let s = subject.clone();
    scheduler.schedule_at(100, move || s.clone().next(1));
    let (s, o) = (subject.clone(), first.clone());
    scheduler.schedule_at(150, move || {
      s.as_observable().subscribe(o);
    });
    let s = subject.clone();
    scheduler.schedule_at(200, move || s.clone().next(2));
    let (s, o) = (subject.clone(), second.clone());
    scheduler.schedule_at(250, move || {
      s.as_observable().subscribe(o);
    });
    let s = subject.clone();
    scheduler.schedule_at(300, move || s.clone().complete());
    let (s, o) = (subject.clone(), scheduler.create_observer::<i32>());
    let late = o.clone();
    scheduler.schedule_at(400, move || {
      s.as_observable().subscribe(o);
    });
    scheduler.start_scheduler();

    assert_eq!(first.messages(), vec![ReactiveTest::on_next(200, 2), ReactiveTest::on_completed(300)]);
    assert_eq!(second.messages(), vec![ReactiveTest::on_completed(300)]);
    assert_eq!(late.messages(), vec![ReactiveTest::on_completed(400)]);
  }

  #[rxkit_macro::test]
  fn unsubscribe_during_push_skips_later_observers() {
    let subject = Subject::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let victim: Arc<Mutex<Option<Subscription>>> = Arc::default();

    let (s, v) = (seen.clone(), victim.clone());
    subject.as_observable().subscribe_next(move |x: i32| {
      s.lock().push(("killer", x));
      if let Some(victim) = v.lock().take() {
        victim.unsubscribe();
      }
    });
    let s = seen.clone();
    let handle = subject.as_observable().subscribe_next(move |x| s.lock().push(("victim", x)));
    *victim.lock() = Some(handle);

    subject.try_next(1).unwrap();
    subject.try_next(2).unwrap();
    assert_eq!(*seen.lock(), vec![("killer", 1), ("killer", 2)]);
  }

  #[rxkit_macro::test]
  fn disposed_subject_rejects_everything() {
    let subject = Subject::<i32>::new();
    subject.dispose();
    assert_eq!(subject.try_next(1), Err(RxError::Disposed));
    assert_eq!(subject.try_complete(), Err(RxError::Disposed));
    assert!(subject.try_subscribe(crate::observer::FnMutObserver(|_: i32| {})).is_err());

    let errors = Arc::new(Mutex::new(vec![]));
    let e = errors.clone();
    subject.as_observable().subscribe_all(|_| {}, move |err| e.lock().push(err), || {});
    assert_eq!(*errors.lock(), vec![RxError::Disposed]);
  }

  #[rxkit_macro::test]
  fn reentrant_push_keeps_global_order() {
    let subject = Subject::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let (s, feed) = (seen.clone(), subject.clone());
    subject.as_observable().subscribe_next(move |x: i32| {
      s.lock().push(("a", x));
      if x == 1 {
        feed.try_next(2).unwrap();
      }
    });
    let s = seen.clone();
    subject.as_observable().subscribe_next(move |x| s.lock().push(("b", x)));
    subject.try_next(1).unwrap();
    assert_eq!(*seen.lock(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
  }
}
