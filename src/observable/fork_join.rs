use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{empty, CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  ops::{into_pair, Either},
  scheduler::SchedulerRef,
  subscription::{CompositeSubscription, SingleSubscription, Subscription, SubscriptionLike},
};

struct ForkJoinOp<T>(Vec<Observable<T>>);

struct ForkJoinState<T> {
  last: Vec<Option<T>>,
  completed: usize,
}

struct ForkJoinObserver<T> {
  index: usize,
  state: Arc<Mutex<ForkJoinState<T>>>,
  observer: Subscriber<Vec<T>>,
  own: SingleSubscription,
  inputs: CompositeSubscription,
}

enum Outcome<T> {
  Wait,
  Emit(Vec<T>),
  Complete,
  Error(RxError),
}

/// Waits for every source to complete and emits a vector of their last
/// values, then completes.
///
/// The first error from any source is forwarded at once. A source that
/// completes without a value ends the output early: with an error when some
/// other source already produced a value, with a plain completion otherwise.
pub fn fork_join<T: Send + 'static>(sources: Vec<Observable<T>>) -> Observable<Vec<T>> {
  Observable::new(ForkJoinOp(sources))
}

/// [`fork_join`] of two sources of different types.
pub fn fork_join_with<A, B>(a: Observable<A>, b: Observable<B>) -> Observable<(A, B)>
where
  A: Clone + Send + Sync + 'static,
  B: Clone + Send + Sync + 'static,
{
  fork_join(vec![a.map(Either::Left), b.map(Either::Right)]).filter_map(into_pair)
}

impl<T: Send + 'static> CoreObservable<Vec<T>> for ForkJoinOp<T> {
  fn actual_subscribe(
    &self, observer: BoxedObserver<Vec<T>>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    if self.0.is_empty() {
      return empty().actual_subscribe(observer, scheduler);
    }
    let state = Arc::new(Mutex::new(ForkJoinState {
      last: self.0.iter().map(|_| None).collect(),
      completed: 0,
    }));
    let observer = Subscriber::from_boxed(observer);
    let inputs = CompositeSubscription::new();
    for (index, source) in self.0.iter().enumerate() {
      let own = SingleSubscription::new();
      inputs.add(own.clone().into());
      let input = ForkJoinObserver {
        index,
        state: state.clone(),
        observer: observer.clone(),
        own: own.clone(),
        inputs: inputs.clone(),
      };
      own.set(source.subscribe_gated(Box::new(input), scheduler.clone()));
    }
    inputs.into()
  }
}

impl<T: Send + 'static> ForkJoinObserver<T> {
  fn finish(&mut self, outcome: Outcome<T>) {
    match outcome {
      Outcome::Wait => return,
      Outcome::Emit(values) => {
        self.observer.next(values);
        self.observer.complete();
      }
      Outcome::Complete => self.observer.complete(),
      Outcome::Error(err) => self.observer.error(err),
    }
    self.inputs.unsubscribe();
  }
}

impl<T: Send + 'static> Observer<T> for ForkJoinObserver<T> {
  fn next(&mut self, value: T) { self.state.lock().last[self.index] = Some(value); }

  fn error(&mut self, err: RxError) { self.finish(Outcome::Error(err)) }

  fn complete(&mut self) {
    let outcome = {
      let mut state = self.state.lock();
      if state.last[self.index].is_none() {
        if state.last.iter().any(Option::is_some) {
          Outcome::Error(RxError::SequenceContainsNoElements)
        } else {
          Outcome::Complete
        }
      } else {
        state.completed += 1;
        if state.completed == state.last.len() {
          Outcome::Emit(state.last.iter_mut().filter_map(Option::take).collect())
        } else {
          Outcome::Wait
        }
      }
    };
    self.own.unsubscribe();
    self.finish(outcome);
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{ReactiveTest, TestScheduler};

  #[rxkit_macro::test]
  fn emits_last_values_when_all_complete() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(220, 2),
      ReactiveTest::on_completed(300),
    ]);
    let ys = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(230, 10),
      ReactiveTest::on_completed(250),
    ]);
    let (x, y) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || fork_join(vec![x, y]));
    assert_eq!(
      res.messages(),
      vec![ReactiveTest::on_next(300, vec![2, 10]), ReactiveTest::on_completed(300)]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 300)]);
    assert_eq!(ys.subscriptions(), vec![ReactiveTest::subscribe(200, 250)]);
  }

  #[rxkit_macro::test]
  fn empty_member_after_values_errors() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![ReactiveTest::on_next(210, 1)]);
    let ys = scheduler.create_hot_observable::<i32>(vec![ReactiveTest::on_completed(250)]);
    let (x, y) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || fork_join(vec![x, y]));
    assert_eq!(
      res.messages(),
      vec![ReactiveTest::on_error(250, RxError::SequenceContainsNoElements)]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 250)]);
  }

  #[rxkit_macro::test]
  fn empty_member_before_values_completes() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![ReactiveTest::on_next(300, 1)]);
    let ys = scheduler.create_hot_observable::<i32>(vec![ReactiveTest::on_completed(250)]);
    let (x, y) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || fork_join(vec![x, y]));
    assert_eq!(res.messages(), vec![ReactiveTest::on_completed(250)]);
  }

  #[rxkit_macro::test]
  fn binary_form() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 'a'),
      ReactiveTest::on_completed(240),
    ]);
    let ys = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(220, 5),
      ReactiveTest::on_completed(260),
    ]);
    let (x, y) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || fork_join_with(x, y));
    assert_eq!(res.messages(), vec![ReactiveTest::on_next(260, ('a', 5)), ReactiveTest::on_completed(260)]);
  }
}
