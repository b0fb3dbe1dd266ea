//! Concurrent flattening: `merge`, `merge_all`, `flat_map` and their
//! bounded-concurrency relative `concat_all`.
use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{concat, sequence, CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::SchedulerRef,
  subscription::{CompositeSubscription, SingleSubscription, Subscription, SubscriptionLike},
};

/// Subscribes to every source at once and forwards all their values. The
/// output completes once every source has completed; the first error ends
/// it and releases the other sources.
pub fn merge<T: Send + 'static>(sources: Vec<Observable<T>>) -> Observable<T> { sequence(sources).merge_all() }

struct MergeAllOp<T> {
  source: Observable<Observable<T>>,
  max_concurrent: Option<usize>,
}

struct Merge<T> {
  observer: Subscriber<T>,
  group: CompositeSubscription,
  scheduler: Option<SchedulerRef>,
  max_concurrent: Option<usize>,
  state: Mutex<MergeState<T>>,
}

struct MergeState<T> {
  active: usize,
  outer_done: bool,
  queue: VecDeque<Observable<T>>,
}

struct OuterObserver<T> {
  merge: Arc<Merge<T>>,
}

struct InnerObserver<T> {
  merge: Arc<Merge<T>>,
  handle: Subscription,
}

impl<T: Send + 'static> Observable<Observable<T>> {
  /// Flattens an observable of observables by subscribing to every inner
  /// observable as it arrives.
  pub fn merge_all(&self) -> Observable<T> { self.flatten(None) }

  /// Like [`merge_all`](Self::merge_all), but with at most `max_concurrent`
  /// inner subscriptions alive; further inner observables wait in a queue.
  pub fn merge_all_max(&self, max_concurrent: usize) -> Observable<T> { self.flatten(Some(max_concurrent.max(1))) }

  /// Subscribes to the inner observables one after the other, in arrival
  /// order.
  pub fn concat_all(&self) -> Observable<T> { self.flatten(Some(1)) }

  fn flatten(&self, max_concurrent: Option<usize>) -> Observable<T> {
    Observable::new(MergeAllOp { source: self.clone(), max_concurrent })
  }
}

impl<T: Send + 'static> Observable<T> {
  pub fn merge_with(&self, other: Observable<T>) -> Observable<T> { merge(vec![self.clone(), other]) }

  /// Emits the values of `self`, then those of `other`.
  pub fn concat_with(&self, other: Observable<T>) -> Observable<T> { concat(vec![self.clone(), other]) }

  /// Maps every value to an observable and merges the results.
  pub fn flat_map<U: Send + 'static>(
    &self, f: impl Fn(T) -> Observable<U> + Send + Sync + 'static,
  ) -> Observable<U> {
    self.map(f).merge_all()
  }

  pub fn try_flat_map<U: Send + 'static>(
    &self, f: impl Fn(T) -> Result<Observable<U>, RxError> + Send + Sync + 'static,
  ) -> Observable<U> {
    self.try_map(f).merge_all()
  }

  /// Maps every value to an observable and concatenates the results.
  pub fn concat_map<U: Send + 'static>(
    &self, f: impl Fn(T) -> Observable<U> + Send + Sync + 'static,
  ) -> Observable<U> {
    self.map(f).concat_all()
  }
}

impl<T: Send + 'static> CoreObservable<T> for MergeAllOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let merge = Arc::new(Merge {
      observer: Subscriber::from_boxed(observer),
      group: CompositeSubscription::new(),
      scheduler: scheduler.clone(),
      max_concurrent: self.max_concurrent,
      state: Mutex::new(MergeState { active: 0, outer_done: false, queue: VecDeque::new() }),
    });
    let outer = SingleSubscription::new();
    merge.group.add(outer.clone().into());
    outer.set(self.source.subscribe_gated(Box::new(OuterObserver { merge: merge.clone() }), scheduler));
    let observer = merge.observer.clone();
    let group = merge.group.clone();
    Subscription::new(move || {
      observer.unsubscribe();
      group.unsubscribe();
    })
  }
}

impl<T: Send + 'static> Merge<T> {
  fn subscribe_inner(self: &Arc<Self>, source: Observable<T>) {
    let holder = SingleSubscription::new();
    let handle: Subscription = holder.clone().into();
    self.group.add(handle.clone());
    let inner = InnerObserver { merge: self.clone(), handle };
    holder.set(source.subscribe_gated(Box::new(inner), self.scheduler.clone()));
  }

  fn fail(&self, err: RxError) {
    self.observer.clone().error(err);
    self.group.unsubscribe();
  }
}

impl<T: Send + 'static> Observer<Observable<T>> for OuterObserver<T> {
  fn next(&mut self, source: Observable<T>) {
    let start = {
      let mut state = self.merge.state.lock();
      match self.merge.max_concurrent {
        Some(max) if state.active >= max => {
          state.queue.push_back(source);
          None
        }
        _ => {
          state.active += 1;
          Some(source)
        }
      }
    };
    if let Some(source) = start {
      self.merge.subscribe_inner(source);
    }
  }

  fn error(&mut self, err: RxError) { self.merge.fail(err) }

  fn complete(&mut self) {
    let done = {
      let mut state = self.merge.state.lock();
      state.outer_done = true;
      state.active == 0
    };
    if done {
      self.merge.observer.clone().complete();
    }
  }

  fn is_closed(&self) -> bool { self.merge.observer.is_closed() }
}

impl<T: Send + 'static> Observer<T> for InnerObserver<T> {
  fn next(&mut self, value: T) { self.merge.observer.clone().next(value) }

  fn error(&mut self, err: RxError) { self.merge.fail(err) }

  fn complete(&mut self) {
    self.merge.group.remove(&self.handle);
    let (next, done) = {
      let mut state = self.merge.state.lock();
      match state.queue.pop_front() {
        Some(source) => (Some(source), false),
        None => {
          state.active -= 1;
          (None, state.active == 0 && state.outer_done)
        }
      }
    };
    if let Some(source) = next {
      self.merge.subscribe_inner(source);
    } else if done {
      self.merge.observer.clone().complete();
    }
  }

  fn is_closed(&self) -> bool { self.merge.observer.is_closed() }
}
