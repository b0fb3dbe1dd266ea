use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{empty, CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  ops::{into_pair, Either},
  scheduler::SchedulerRef,
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

struct ZipOp<T>(Vec<Observable<T>>);

struct ZipState<T> {
  queues: Vec<VecDeque<T>>,
  done: Vec<bool>,
}

struct ZipObserver<T> {
  index: usize,
  state: Arc<Mutex<ZipState<T>>>,
  observer: Subscriber<Vec<T>>,
  inputs: CompositeSubscription,
}

/// Pairs up the n-th values of every source into a vector.
///
/// The output completes as soon as no further vector can be formed: when a
/// source completes with nothing queued, or when a vector has just been
/// emitted and a completed source has run dry.
pub fn zip<T: Send + 'static>(sources: Vec<Observable<T>>) -> Observable<Vec<T>> { Observable::new(ZipOp(sources)) }

impl<T: Send + 'static> Observable<T> {
  /// Zips `self` with a source of another type.
  pub fn zip_with<U>(&self, other: Observable<U>) -> Observable<(T, U)>
  where
    T: Sync,
    U: Send + Sync + 'static,
  {
    zip(vec![self.map(Either::Left), other.map(Either::Right)]).filter_map(into_pair)
  }
}

impl<T: Send + 'static> CoreObservable<Vec<T>> for ZipOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<Vec<T>>, scheduler: Option<SchedulerRef>) -> Subscription {
    if self.0.is_empty() {
      return empty().actual_subscribe(observer, scheduler);
    }
    let state = Arc::new(Mutex::new(ZipState {
      queues: self.0.iter().map(|_| VecDeque::new()).collect(),
      done: vec![false; self.0.len()],
    }));
    let observer = Subscriber::from_boxed(observer);
    let inputs = CompositeSubscription::new();
    for (index, source) in self.0.iter().enumerate() {
      let input = ZipObserver { index, state: state.clone(), observer: observer.clone(), inputs: inputs.clone() };
      inputs.add(source.subscribe_gated(Box::new(input), scheduler.clone()));
    }
    inputs.into()
  }
}

impl<T: Send + 'static> ZipObserver<T> {
  fn finish(&mut self) {
    self.observer.complete();
    self.inputs.unsubscribe();
  }
}

impl<T: Send + 'static> Observer<T> for ZipObserver<T> {
  fn next(&mut self, value: T) {
    let (row, complete) = {
      let mut state = self.state.lock();
      state.queues[self.index].push_back(value);
      if state.queues.iter().all(|q| !q.is_empty()) {
        let row: Vec<T> = state.queues.iter_mut().filter_map(VecDeque::pop_front).collect();
        let exhausted = state.queues.iter().zip(&state.done).any(|(q, done)| *done && q.is_empty());
        (Some(row), exhausted)
      } else {
        let others_done = state.done.iter().enumerate().all(|(i, done)| i == self.index || *done);
        (None, others_done)
      }
    };
    if let Some(row) = row {
      self.observer.next(row);
    }
    if complete {
      self.finish();
    }
  }

  fn error(&mut self, err: RxError) {
    self.observer.error(err);
    self.inputs.unsubscribe();
  }

  fn complete(&mut self) {
    let dry = {
      let mut state = self.state.lock();
      state.done[self.index] = true;
      state.queues[self.index].is_empty()
    };
    if dry {
      self.finish();
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
