use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::Mutex;

use super::{warn_disposed, SubjectCore};
use crate::{
  error::RxError,
  notification::Notification,
  observable::{CoreObservable, Observable, SubjectLike},
  observer::{BoxedObserver, Observer},
  scheduler::{CurrentThreadScheduler, SchedulerRef},
  subscription::Subscription,
};

/// Replays buffered values to every new subscriber, then forwards live
/// ones.
///
/// The buffer keeps at most `buffer_size` values, none older than `window`
/// according to the subject's scheduler; both limits apply together.
/// Replay is synchronous; the scheduler is only used to timestamp values.
pub struct ReplaySubject<T> {
  core: Arc<SubjectCore<T>>,
  buffer: Arc<Mutex<ReplayBuffer<T>>>,
}

struct ReplayBuffer<T> {
  size: Option<usize>,
  window: Option<Duration>,
  scheduler: SchedulerRef,
  items: VecDeque<(Duration, T)>,
}

impl<T> ReplayBuffer<T> {
  fn trim(&mut self) {
    if let Some(size) = self.size {
      while self.items.len() > size {
        self.items.pop_front();
      }
    }
    if let Some(window) = self.window {
      let now = self.scheduler.now();
      while matches!(self.items.front(), Some((at, _)) if now.saturating_sub(*at) > window) {
        self.items.pop_front();
      }
    }
  }
}

impl<T> Clone for ReplaySubject<T> {
  fn clone(&self) -> Self { ReplaySubject { core: self.core.clone(), buffer: self.buffer.clone() } }
}

impl<T: Clone + Send + Sync + 'static> ReplaySubject<T> {
  pub fn new(buffer_size: Option<usize>, window: Option<Duration>, scheduler: Option<SchedulerRef>) -> Self {
    let scheduler = scheduler.unwrap_or_else(|| Arc::new(CurrentThreadScheduler::new()));
    ReplaySubject {
      core: Arc::default(),
      buffer: Arc::new(Mutex::new(ReplayBuffer {
        size: buffer_size,
        window,
        scheduler,
        items: VecDeque::new(),
      })),
    }
  }

  /// Replays everything ever pushed.
  pub fn unbounded() -> Self { Self::new(None, None, None) }

  /// Replays the last `buffer_size` values.
  pub fn with_buffer_size(buffer_size: usize) -> Self { Self::new(Some(buffer_size), None, None) }

  pub fn try_next(&self, value: T) -> Result<(), RxError> { self.push(Notification::Next(value)) }

  pub fn try_error(&self, err: RxError) -> Result<(), RxError> { self.push(Notification::Error(err)) }

  pub fn try_complete(&self) -> Result<(), RxError> { self.push(Notification::Complete) }

  fn push(&self, item: Notification<T>) -> Result<(), RxError> {
    self.core.serialize(item, |item| {
      if let Notification::Next(value) = &item {
        if !self.core.is_stopped() {
          let mut buffer = self.buffer.lock();
          let now = buffer.scheduler.now();
          buffer.items.push_back((now, value.clone()));
          buffer.trim();
        }
      }
      self.core.publish(item);
    })
  }

  pub fn try_subscribe(&self, observer: impl Observer<T> + 'static) -> Result<Subscription, RxError> {
    self.subscribe_core(Box::new(observer)).map_err(|_| RxError::Disposed)
  }

  fn subscribe_core(&self, observer: BoxedObserver<T>) -> Result<Subscription, BoxedObserver<T>> {
    let buffer = self.buffer.clone();
    self.core.subscribe(observer, move |subscriber, _| {
      let replay: Vec<T> = {
        let mut buffer = buffer.lock();
        buffer.trim();
        buffer.items.iter().map(|(_, v)| v.clone()).collect()
      };
      for value in replay {
        subscriber.next(value);
      }
    })
  }

  /// Drops every subscriber and the buffer.
  pub fn dispose(&self) {
    self.core.dispose();
    self.buffer.lock().items.clear();
  }

  pub fn is_disposed(&self) -> bool { self.core.is_disposed() }

  pub fn observer_count(&self) -> usize { self.core.observer_count() }

  pub fn as_observable(&self) -> Observable<T> { Observable::new(self.clone()) }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for ReplaySubject<T> {
  fn next(&mut self, value: T) { warn_disposed(self.try_next(value)) }

  fn error(&mut self, err: RxError) { warn_disposed(self.try_error(err)) }

  fn complete(&mut self) { warn_disposed(self.try_complete()) }

  fn is_closed(&self) -> bool { self.core.is_stopped() || self.core.is_disposed() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for ReplaySubject<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, _: Option<SchedulerRef>) -> Subscription {
    self.subscribe_core(observer).unwrap_or_else(|mut observer| {
      observer.error(RxError::Disposed);
      Subscription::empty()
    })
  }
}

impl<T: Clone + Send + Sync + 'static> SubjectLike<T> for ReplaySubject<T> {
  fn as_observer(&self) -> BoxedObserver<T> { Box::new(self.clone()) }

  fn as_observable(&self) -> Observable<T> { ReplaySubject::as_observable(self) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{ticks, ReactiveTest, TestScheduler, Timing};

  fn pushes(scheduler: &TestScheduler, subject: &ReplaySubject<i32>) {
    for (at, push) in [
      (70, Notification::Next(1)),
      (110, Notification::Next(2)),
      (220, Notification::Next(3)),
      (270, Notification::Next(4)),
      (340, Notification::Next(5)),
      (410, Notification::Next(6)),
      (520, Notification::Complete),
    ] {
      let s = subject.clone();
      scheduler.schedule_at(at, move || push.accept(&mut s.clone()));
    }
  }

  #[rxkit_macro::test]
  fn replays_last_n_then_live() {
    let scheduler = TestScheduler::new();
    let subject = ReplaySubject::new(Some(2), None, Some(scheduler.as_scheduler()));
    pushes(&scheduler, &subject);
    let src = subject.as_observable();
    let res = scheduler.start_with_timing(
      move || src,
      Timing { created: 100, subscribed: 300, disposed: 1000 },
    );
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(300, 3),
        ReactiveTest::on_next(300, 4),
        ReactiveTest::on_next(340, 5),
        ReactiveTest::on_next(410, 6),
        ReactiveTest::on_completed(520),
      ]
    );
  }

  #[rxkit_macro::test]
  fn time_window_trims_old_values() {
    let scheduler = TestScheduler::new();
    let subject = ReplaySubject::new(None, Some(ticks(100)), Some(scheduler.as_scheduler()));
    pushes(&scheduler, &subject);
    let src = subject.as_observable();
    let res = scheduler.start_with_timing(
      move || src,
      Timing { created: 100, subscribed: 300, disposed: 1000 },
    );
    assert_eq!(
      res.messages()[..2],
      [ReactiveTest::on_next(300, 3), ReactiveTest::on_next(300, 4)]
    );
  }

  #[rxkit_macro::test]
  fn late_subscriber_after_completion_gets_buffer_and_terminal() {
    let subject = ReplaySubject::with_buffer_size(1);
    subject.try_next(1).unwrap();
    subject.try_next(2).unwrap();
    subject.try_complete().unwrap();
    let seen = Arc::new(Mutex::new(vec![]));
    let (v, c) = (seen.clone(), seen.clone());
    subject.as_observable().subscribe_all(
      move |x| v.lock().push(Notification::Next(x)),
      |_| {},
      move || c.lock().push(Notification::Complete),
    );
    assert_eq!(*seen.lock(), vec![Notification::Next(2), Notification::Complete]);
  }
}
