use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::SchedulerRef,
  subscription::{SingleSubscription, Subscription, SubscriptionLike},
};

/// Mirrors whichever source notifies first and releases all the others.
/// With no sources the output never notifies.
pub fn amb<T: Send + 'static>(sources: Vec<Observable<T>>) -> Observable<T> { Observable::new(AmbOp { sources }) }

impl<T: Send + 'static> Observable<T> {
  pub fn amb_with(&self, other: Observable<T>) -> Observable<T> { amb(vec![self.clone(), other]) }
}

struct AmbOp<T> {
  sources: Vec<Observable<T>>,
}

struct Amb<T> {
  observer: Subscriber<T>,
  inputs: Vec<SingleSubscription>,
  winner: Mutex<Option<usize>>,
}

struct AmbObserver<T> {
  amb: Arc<Amb<T>>,
  index: usize,
}

impl<T: Send + 'static> CoreObservable<T> for AmbOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let amb = Arc::new(Amb {
      observer: Subscriber::from_boxed(observer),
      inputs: self.sources.iter().map(|_| SingleSubscription::new()).collect(),
      winner: Mutex::new(None),
    });
    for (index, source) in self.sources.iter().enumerate() {
      let observer = AmbObserver { amb: amb.clone(), index };
      amb.inputs[index].set(source.subscribe_gated(Box::new(observer), scheduler.clone()));
    }
    Subscription::new(move || {
      amb.observer.unsubscribe();
      for input in &amb.inputs {
        input.unsubscribe();
      }
    })
  }
}

impl<T> Amb<T> {
  /// Whether `index` may forward; the first caller becomes the winner.
  fn claim(&self, index: usize) -> bool {
    let elected = {
      let mut winner = self.winner.lock();
      match *winner {
        Some(w) => return w == index,
        None => {
          *winner = Some(index);
          index
        }
      }
    };
    for (i, input) in self.inputs.iter().enumerate() {
      if i != elected {
        input.unsubscribe();
      }
    }
    true
  }

  fn lost(&self, index: usize) -> bool { matches!(*self.winner.lock(), Some(w) if w != index) }
}

impl<T: Send + 'static> Observer<T> for AmbObserver<T> {
  fn next(&mut self, value: T) {
    if self.amb.claim(self.index) {
      self.amb.observer.clone().next(value);
    }
  }

  fn error(&mut self, err: RxError) {
    if self.amb.claim(self.index) {
      self.amb.observer.clone().error(err);
    }
  }

  fn complete(&mut self) {
    if self.amb.claim(self.index) {
      self.amb.observer.clone().complete();
    }
  }

  fn is_closed(&self) -> bool { self.amb.observer.is_closed() || self.amb.lost(self.index) }
}

#[cfg(test)]
mod tests {
  use super::amb;
  use crate::testing::{ReactiveTest, TestScheduler};

  #[rxkit_macro::test]
  fn first_to_notify_wins() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(150, 1),
      ReactiveTest::on_next(210, 2),
      ReactiveTest::on_completed(240),
    ]);
    let ys = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(150, 1),
      ReactiveTest::on_next(220, 3),
      ReactiveTest::on_completed(250),
    ]);
    let (x, y) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || x.amb_with(y));
    assert_eq!(res.messages(), vec![ReactiveTest::on_next(210, 2), ReactiveTest::on_completed(240)]);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 240)]);
    assert_eq!(ys.subscriptions(), vec![ReactiveTest::subscribe(200, 210)]);
  }

  #[rxkit_macro::test]
  fn an_early_error_wins_too() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable::<i32>(vec![ReactiveTest::on_error(210, "ex")]);
    let ys = scheduler.create_hot_observable(vec![ReactiveTest::on_next(220, 3), ReactiveTest::on_completed(250)]);
    let zs = scheduler.create_hot_observable(vec![ReactiveTest::on_next(230, 4)]);
    let sources = vec![xs.as_observable(), ys.as_observable(), zs.as_observable()];
    let res = scheduler.start(move || amb(sources));
    assert_eq!(res.messages(), vec![ReactiveTest::on_error(210, "ex")]);
    assert_eq!(ys.subscriptions(), vec![ReactiveTest::subscribe(200, 210)]);
    assert_eq!(zs.subscriptions(), vec![ReactiveTest::subscribe(200, 210)]);
  }

  #[rxkit_macro::test]
  fn silent_sources_stay_silent() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![ReactiveTest::on_next(150, 1)]);
    let ys = scheduler.create_hot_observable(vec![ReactiveTest::on_next(150, 1)]);
    let (x, y) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || x.amb_with(y));
    assert!(res.messages().is_empty());
    assert_eq!(ys.subscriptions(), vec![ReactiveTest::subscribe(200, 1000)]);
  }
}
