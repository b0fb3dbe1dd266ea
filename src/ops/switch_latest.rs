use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::SchedulerRef,
  subscription::{SerialSubscription, SingleSubscription, Subscription, SubscriptionLike},
};

struct SwitchLatestOp<T> {
  source: Observable<Observable<T>>,
}

struct Switch<T> {
  observer: Subscriber<T>,
  outer: SingleSubscription,
  inner: SerialSubscription,
  scheduler: Option<SchedulerRef>,
  state: Mutex<SwitchState>,
}

struct SwitchState {
  latest: u64,
  has_latest: bool,
  outer_done: bool,
}

struct OuterObserver<T>(Arc<Switch<T>>);

struct InnerObserver<T> {
  switch: Arc<Switch<T>>,
  id: u64,
  handle: Subscription,
}

impl<T: Send + 'static> Observable<Observable<T>> {
  /// Mirrors the most recent inner observable, releasing the previous one
  /// whenever a new one arrives. Completes once the outer source and the
  /// current inner observable have both completed.
  pub fn switch_latest(&self) -> Observable<T> { Observable::new(SwitchLatestOp { source: self.clone() }) }
}

impl<T: Send + 'static> Observable<T> {
  /// Maps every value to an observable and mirrors only the latest one.
  pub fn switch_map<U: Send + 'static>(
    &self, f: impl Fn(T) -> Observable<U> + Send + Sync + 'static,
  ) -> Observable<U> {
    self.map(f).switch_latest()
  }

  pub fn try_switch_map<U: Send + 'static>(
    &self, f: impl Fn(T) -> Result<Observable<U>, RxError> + Send + Sync + 'static,
  ) -> Observable<U> {
    self.try_map(f).switch_latest()
  }
}

impl<T: Send + 'static> CoreObservable<T> for SwitchLatestOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let switch = Arc::new(Switch {
      observer: Subscriber::from_boxed(observer),
      outer: SingleSubscription::new(),
      inner: SerialSubscription::new(),
      scheduler: scheduler.clone(),
      state: Mutex::new(SwitchState { latest: 0, has_latest: false, outer_done: false }),
    });
    let outer = self.source.subscribe_gated(Box::new(OuterObserver(switch.clone())), scheduler);
    switch.outer.set(outer);
    Subscription::new(move || {
      switch.observer.unsubscribe();
      switch.outer.unsubscribe();
      switch.inner.unsubscribe();
    })
  }
}

impl<T: Send + 'static> Switch<T> {
  fn is_latest(&self, id: u64) -> bool { self.state.lock().latest == id }

  fn fail(&self, err: RxError) {
    self.observer.clone().error(err);
    self.inner.unsubscribe();
  }
}

impl<T: Send + 'static> Observer<Observable<T>> for OuterObserver<T> {
  fn next(&mut self, source: Observable<T>) {
    let id = {
      let mut state = self.0.state.lock();
      state.latest += 1;
      state.has_latest = true;
      state.latest
    };
    let holder = SingleSubscription::new();
    let handle: Subscription = holder.clone().into();
    self.0.inner.set(handle.clone());
    let inner = InnerObserver { switch: self.0.clone(), id, handle };
    holder.set(source.subscribe_gated(Box::new(inner), self.0.scheduler.clone()));
  }

  fn error(&mut self, err: RxError) { self.0.fail(err) }

  fn complete(&mut self) {
    let done = {
      let mut state = self.0.state.lock();
      state.outer_done = true;
      !state.has_latest
    };
    self.0.outer.unsubscribe();
    if done {
      self.0.observer.clone().complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

impl<T: Send + 'static> Observer<T> for InnerObserver<T> {
  fn next(&mut self, value: T) {
    if self.switch.is_latest(self.id) {
      self.switch.observer.clone().next(value);
    }
  }

  fn error(&mut self, err: RxError) {
    if self.switch.is_latest(self.id) {
      self.switch.fail(err);
    }
  }

  fn complete(&mut self) {
    let done = {
      let mut state = self.switch.state.lock();
      if state.latest != self.id {
        return;
      }
      state.has_latest = false;
      state.outer_done
    };
    self.handle.unsubscribe();
    if done {
      self.switch.observer.clone().complete();
    }
  }

  fn is_closed(&self) -> bool { self.switch.observer.is_closed() || !self.switch.is_latest(self.id) }
}

#[cfg(test)]
mod tests {
  use crate::{
    observable::Observable,
    testing::{ReactiveTest, TestScheduler},
  };

  #[rxkit_macro::test]
  fn follows_the_latest_inner() {
    let scheduler = TestScheduler::new();
    let ys1 = scheduler.create_cold_observable(vec![
      ReactiveTest::on_next(10, 101),
      ReactiveTest::on_next(20, 102),
      ReactiveTest::on_next(110, 103),
      ReactiveTest::on_next(120, 104),
      ReactiveTest::on_next(210, 105),
      ReactiveTest::on_next(220, 106),
      ReactiveTest::on_completed(230),
    ]);
    let ys2 = scheduler.create_cold_observable(vec![
      ReactiveTest::on_next(10, 201),
      ReactiveTest::on_next(20, 202),
      ReactiveTest::on_next(30, 203),
      ReactiveTest::on_next(40, 204),
      ReactiveTest::on_completed(50),
    ]);
    let ys3 = scheduler.create_cold_observable(vec![
      ReactiveTest::on_next(10, 301),
      ReactiveTest::on_next(20, 302),
      ReactiveTest::on_next(30, 303),
      ReactiveTest::on_next(40, 304),
      ReactiveTest::on_completed(150),
    ]);
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(300, ys1.as_observable()),
      ReactiveTest::on_next(400, ys2.as_observable()),
      ReactiveTest::on_next(500, ys3.as_observable()),
      ReactiveTest::on_completed(600),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.switch_latest());
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(310, 101),
        ReactiveTest::on_next(320, 102),
        ReactiveTest::on_next(410, 201),
        ReactiveTest::on_next(420, 202),
        ReactiveTest::on_next(430, 203),
        ReactiveTest::on_next(440, 204),
        ReactiveTest::on_next(510, 301),
        ReactiveTest::on_next(520, 302),
        ReactiveTest::on_next(530, 303),
        ReactiveTest::on_next(540, 304),
        ReactiveTest::on_completed(650),
      ]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 600)]);
    assert_eq!(ys1.subscriptions(), vec![ReactiveTest::subscribe(300, 400)]);
    assert_eq!(ys2.subscriptions(), vec![ReactiveTest::subscribe(400, 450)]);
    assert_eq!(ys3.subscriptions(), vec![ReactiveTest::subscribe(500, 650)]);
  }

  #[rxkit_macro::test]
  fn inner_error_ends_the_output() {
    let scheduler = TestScheduler::new();
    let ys1 = scheduler.create_cold_observable(vec![ReactiveTest::on_next(10, 101), ReactiveTest::on_error(50, "ex")]);
    let ys2 = scheduler.create_cold_observable(vec![ReactiveTest::on_next(10, 201)]);
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(300, ys1.as_observable()),
      ReactiveTest::on_next(400, ys2.as_observable()),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.switch_latest());
    assert_eq!(res.messages(), vec![ReactiveTest::on_next(310, 101), ReactiveTest::on_error(350, "ex")]);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 350)]);
  }

  #[rxkit_macro::test]
  fn switch_map_drops_stale_inners() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(230, 2),
      ReactiveTest::on_completed(300),
    ]);
    let (src, s) = (xs.as_observable(), scheduler.clone());
    let res = scheduler.start(move || {
      src.switch_map(move |x| -> Observable<i32> {
        s.create_cold_observable(vec![
          ReactiveTest::on_next(10, x * 10),
          ReactiveTest::on_next(30, x * 100),
          ReactiveTest::on_completed(40),
        ])
        .as_observable()
      })
    });
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(220, 10),
        ReactiveTest::on_next(240, 20),
        ReactiveTest::on_next(260, 200),
        ReactiveTest::on_completed(300),
      ]
    );
  }
}
