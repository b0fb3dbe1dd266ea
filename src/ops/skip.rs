use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::SchedulerRef,
  subscription::{CompositeSubscription, SingleSubscription, Subscription, SubscriptionLike},
};

struct SkipOp<T> {
  source: Observable<T>,
  count: usize,
}

struct SkipObserver<T> {
  observer: BoxedObserver<T>,
  remaining: usize,
}

type Predicate<T> = dyn Fn(&T) -> Result<bool, RxError> + Send + Sync;

struct SkipWhileOp<T> {
  source: Observable<T>,
  predicate: Arc<Predicate<T>>,
}

struct SkipWhileObserver<T> {
  observer: BoxedObserver<T>,
  predicate: Arc<Predicate<T>>,
  skipping: bool,
  done: bool,
}

struct SkipUntilOp<T, N> {
  source: Observable<T>,
  notifier: Observable<N>,
}

struct SkipUntilObserver<T> {
  observer: Subscriber<T>,
  open: Arc<AtomicBool>,
}

struct SkipUntilNotifier<T> {
  observer: Subscriber<T>,
  open: Arc<AtomicBool>,
  own: SingleSubscription,
}

impl<T: Send + 'static> Observable<T> {
  /// Drops the first `count` values and forwards the rest.
  pub fn skip(&self, count: usize) -> Observable<T> { Observable::new(SkipOp { source: self.clone(), count }) }

  /// Drops values while `predicate` holds; from the first value for which
  /// it does not, everything is forwarded.
  pub fn skip_while(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Observable<T> {
    self.try_skip_while(move |v| Ok(predicate(v)))
  }

  pub fn try_skip_while(
    &self, predicate: impl Fn(&T) -> Result<bool, RxError> + Send + Sync + 'static,
  ) -> Observable<T> {
    Observable::new(SkipWhileOp { source: self.clone(), predicate: Arc::new(predicate) })
  }

  /// Drops values until `notifier` emits. If the notifier completes without
  /// emitting, nothing is ever forwarded, not even the completion.
  pub fn skip_until<N: Send + 'static>(&self, notifier: Observable<N>) -> Observable<T> {
    Observable::new(SkipUntilOp { source: self.clone(), notifier })
  }
}

impl<T: Send + 'static> CoreObservable<T> for SkipOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    self.source.actual_subscribe(Box::new(SkipObserver { observer, remaining: self.count }), scheduler)
  }
}

impl<T> Observer<T> for SkipObserver<T> {
  fn next(&mut self, value: T) {
    if self.remaining == 0 {
      self.observer.next(value);
    } else {
      self.remaining -= 1;
    }
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<T: Send + 'static> CoreObservable<T> for SkipWhileOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = SkipWhileObserver { observer, predicate: self.predicate.clone(), skipping: true, done: false };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T> Observer<T> for SkipWhileObserver<T> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    if self.skipping {
      match (self.predicate)(&value) {
        Ok(true) => return,
        Ok(false) => self.skipping = false,
        Err(err) => {
          self.done = true;
          self.observer.error(err);
          return;
        }
      }
    }
    self.observer.next(value);
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.done || self.observer.is_closed() }
}

impl<T: Send + 'static, N: Send + 'static> CoreObservable<T> for SkipUntilOp<T, N> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = Subscriber::from_boxed(observer);
    let open = Arc::new(AtomicBool::new(false));
    let group = CompositeSubscription::new();
    let own = SingleSubscription::new();
    group.add(own.clone().into());
    let notifier = SkipUntilNotifier { observer: observer.clone(), open: open.clone(), own: own.clone() };
    own.set(self.notifier.subscribe_gated(Box::new(notifier), scheduler.clone()));
    group.add(self.source.actual_subscribe(Box::new(SkipUntilObserver { observer, open }), scheduler));
    group.into()
  }
}

impl<T: Send + 'static> Observer<T> for SkipUntilObserver<T> {
  fn next(&mut self, value: T) {
    if self.open.load(Ordering::Acquire) {
      self.observer.next(value);
    }
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) {
    if self.open.load(Ordering::Acquire) {
      self.observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<T: Send + 'static, N> Observer<N> for SkipUntilNotifier<T> {
  fn next(&mut self, _: N) {
    self.open.store(true, Ordering::Release);
    self.own.unsubscribe();
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) {}

  fn is_closed(&self) -> bool { self.own.is_closed() || self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable::from_iter,
    testing::{ReactiveTest, TestScheduler},
  };

  #[rxkit_macro::test]
  fn skip_first_values() {
    let seen = Arc::new(parking_lot::Mutex::new(vec![]));
    let s = seen.clone();
    from_iter(0..6).skip(4).subscribe_next(move |v| s.lock().push(v));
    assert_eq!(*seen.lock(), vec![4, 5]);
  }

  #[rxkit_macro::test]
  fn skip_while_then_everything() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(220, 3),
      ReactiveTest::on_next(230, 4),
      ReactiveTest::on_next(240, 5),
      ReactiveTest::on_completed(300),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.skip_while(|v| v % 2 == 1));
    assert_eq!(
      res.messages(),
      vec![ReactiveTest::on_next(230, 4), ReactiveTest::on_next(240, 5), ReactiveTest::on_completed(300)]
    );
  }

  #[rxkit_macro::test]
  fn skip_while_predicate_error() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![ReactiveTest::on_next(210, 1), ReactiveTest::on_completed(300)]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.try_skip_while(|_| Err("ex".into())));
    assert_eq!(res.messages(), vec![ReactiveTest::on_error(210, "ex")]);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 210)]);
  }

  #[rxkit_macro::test]
  fn skip_until_opens_the_gate() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(230, 2),
      ReactiveTest::on_next(250, 3),
      ReactiveTest::on_completed(300),
    ]);
    let ys = scheduler.create_hot_observable(vec![ReactiveTest::on_next(225, "go"), ReactiveTest::on_next(235, "again")]);
    let (src, other) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || src.skip_until(other));
    assert_eq!(
      res.messages(),
      vec![ReactiveTest::on_next(230, 2), ReactiveTest::on_next(250, 3), ReactiveTest::on_completed(300)]
    );
    assert_eq!(ys.subscriptions(), vec![ReactiveTest::subscribe(200, 225)]);
  }

  #[rxkit_macro::test]
  fn skip_until_empty_notifier_drops_forever() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(250, 2),
      ReactiveTest::on_completed(300),
    ]);
    let ys = scheduler.create_hot_observable::<i32>(vec![ReactiveTest::on_completed(220)]);
    let (src, other) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || src.skip_until(other));
    assert!(res.messages().is_empty());
  }
}
