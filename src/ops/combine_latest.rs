use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{empty, CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  ops::{into_pair, Either},
  scheduler::SchedulerRef,
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

struct CombineLatestOp<T>(Vec<Observable<T>>);

struct CombineState<T> {
  latest: Vec<Option<T>>,
  done: Vec<bool>,
}

struct CombineLatestObserver<T> {
  index: usize,
  state: Arc<Mutex<CombineState<T>>>,
  observer: Subscriber<Vec<T>>,
  inputs: CompositeSubscription,
}

/// Once every source has emitted, emits the latest value of each source
/// whenever any of them emits.
///
/// Completes when every source has completed, or when a source emits while
/// all the others have completed without some of them ever emitting.
pub fn combine_latest<T: Clone + Send + 'static>(sources: Vec<Observable<T>>) -> Observable<Vec<T>> {
  Observable::new(CombineLatestOp(sources))
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
  pub fn combine_latest_with<U: Clone + Send + Sync + 'static>(&self, other: Observable<U>) -> Observable<(T, U)> {
    combine_latest(vec![self.map(Either::Left), other.map(Either::Right)]).filter_map(into_pair)
  }
}

impl<T: Clone + Send + 'static> CoreObservable<Vec<T>> for CombineLatestOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<Vec<T>>, scheduler: Option<SchedulerRef>) -> Subscription {
    if self.0.is_empty() {
      return empty().actual_subscribe(observer, scheduler);
    }
    let state = Arc::new(Mutex::new(CombineState {
      latest: self.0.iter().map(|_| None).collect(),
      done: vec![false; self.0.len()],
    }));
    let observer = Subscriber::from_boxed(observer);
    let inputs = CompositeSubscription::new();
    for (index, source) in self.0.iter().enumerate() {
      let input =
        CombineLatestObserver { index, state: state.clone(), observer: observer.clone(), inputs: inputs.clone() };
      inputs.add(source.subscribe_gated(Box::new(input), scheduler.clone()));
    }
    inputs.into()
  }
}

impl<T: Clone + Send + 'static> CombineLatestObserver<T> {
  fn finish(&mut self) {
    self.observer.complete();
    self.inputs.unsubscribe();
  }
}

impl<T: Clone + Send + 'static> Observer<T> for CombineLatestObserver<T> {
  fn next(&mut self, value: T) {
    let (row, complete) = {
      let mut state = self.state.lock();
      state.latest[self.index] = Some(value);
      if state.latest.iter().all(Option::is_some) {
        (Some(state.latest.iter().flatten().cloned().collect::<Vec<_>>()), false)
      } else {
        (None, state.done.iter().enumerate().all(|(i, done)| i == self.index || *done))
      }
    };
    if let Some(row) = row {
      self.observer.next(row);
    } else if complete {
      self.finish();
    }
  }

  fn error(&mut self, err: RxError) {
    self.observer.error(err);
    self.inputs.unsubscribe();
  }

  fn complete(&mut self) {
    let all_done = {
      let mut state = self.state.lock();
      state.done[self.index] = true;
      state.done.iter().all(|d| *d)
    };
    if all_done {
      self.finish();
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
