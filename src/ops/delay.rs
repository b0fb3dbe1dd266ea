use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  notification::Notification,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::{schedule_recursive, timeout_or, SchedulerRef},
  subscription::{SerialSubscription, Subscription, SubscriptionLike},
};

impl<T: Send + 'static> Observable<T> {
  /// Shifts every value and the completion later by `due`. Errors are not
  /// delayed: they are delivered at once and drop whatever is still queued.
  pub fn delay(&self, due: Duration) -> Observable<T> { self.delay_on(due, None) }

  /// [`delay`](Self::delay) with its timers on `scheduler`.
  pub fn delay_on(&self, due: Duration, scheduler: Option<SchedulerRef>) -> Observable<T> {
    Observable::new(DelayOp { source: self.clone(), due, scheduler })
  }
}

struct DelayOp<T> {
  source: Observable<T>,
  due: Duration,
  scheduler: Option<SchedulerRef>,
}

struct Delay<T> {
  observer: Subscriber<T>,
  scheduler: SchedulerRef,
  due: Duration,
  timer: SerialSubscription,
  state: Mutex<DelayState<T>>,
}

struct DelayState<T> {
  queue: VecDeque<(Duration, Notification<T>)>,
  active: bool,
}

struct DelayObserver<T>(Arc<Delay<T>>);

impl<T: Send + 'static> CoreObservable<T> for DelayOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let state = Arc::new(Delay {
      observer: Subscriber::from_boxed(observer),
      scheduler: timeout_or(&self.scheduler.clone().or_else(|| scheduler.clone())),
      due: self.due,
      timer: SerialSubscription::new(),
      state: Mutex::new(DelayState { queue: VecDeque::new(), active: false }),
    });
    let source = self.source.actual_subscribe(Box::new(DelayObserver(state.clone())), scheduler);
    Subscription::new(move || {
      source.unsubscribe();
      state.timer.unsubscribe();
      state.observer.unsubscribe();
    })
  }
}

impl<T: Send + 'static> Delay<T> {
  fn enqueue(self: &Arc<Self>, item: Notification<T>) {
    let start = {
      let mut state = self.state.lock();
      state.queue.push_back((self.scheduler.now() + self.due, item));
      !std::mem::replace(&mut state.active, true)
    };
    if start {
      let this = self.clone();
      self.timer.set(schedule_recursive(&self.scheduler, self.due, move || this.drain()));
    }
  }

  /// Delivers everything that is due; returns the wait until the next item.
  fn drain(&self) -> Option<Duration> {
    let mut observer = self.observer.clone();
    loop {
      let now = self.scheduler.now();
      let item = {
        let mut state = self.state.lock();
        match state.queue.front() {
          Some((at, _)) if *at <= now => state.queue.pop_front().map(|(_, item)| item),
          Some((at, _)) => return Some(at.saturating_sub(now)),
          None => {
            state.active = false;
            return None;
          }
        }
      };
      if let Some(item) = item {
        item.accept(&mut observer);
      }
    }
  }
}

impl<T: Send + 'static> Observer<T> for DelayObserver<T> {
  fn next(&mut self, value: T) { self.0.enqueue(Notification::Next(value)) }

  fn error(&mut self, err: RxError) {
    self.0.timer.unsubscribe();
    self.0.state.lock().queue.clear();
    self.0.observer.clone().error(err);
  }

  fn complete(&mut self) { self.0.enqueue(Notification::Complete) }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{ticks, ReactiveTest, TestScheduler};

  #[rxkit_macro::test]
  fn shifts_values_and_completion() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(150, 1),
      ReactiveTest::on_next(250, 2),
      ReactiveTest::on_next(350, 3),
      ReactiveTest::on_next(450, 4),
      ReactiveTest::on_completed(550),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.delay(ticks(100)));
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(350, 2),
        ReactiveTest::on_next(450, 3),
        ReactiveTest::on_next(550, 4),
        ReactiveTest::on_completed(650),
      ]
    );
  }

  #[rxkit_macro::test]
  fn close_values_share_one_timer() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(215, 2),
      ReactiveTest::on_completed(220),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.delay(ticks(10)));
    assert_eq!(
      res.messages(),
      vec![ReactiveTest::on_next(220, 1), ReactiveTest::on_next(225, 2), ReactiveTest::on_completed(230)]
    );
  }

  #[rxkit_macro::test]
  fn error_is_not_delayed() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![ReactiveTest::on_next(250, 2), ReactiveTest::on_error(300, "ex")]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.delay(ticks(100)));
    assert_eq!(res.messages(), vec![ReactiveTest::on_error(300, "ex")]);
  }
}
