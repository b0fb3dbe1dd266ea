//! Joins of two sequences by overlapping lifetimes.
//!
//! Every value of either side is open from its arrival until its duration
//! observable emits or completes. `join` pairs values whose lifetimes
//! overlap; `group_join` hands each left value a window carrying the right
//! values that overlap it.
use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  ops::add_ref,
  scheduler::SchedulerRef,
  subject::Subject,
  subscription::{CompositeSubscription, RefCountSubscription, SingleSubscription, Subscription, SubscriptionLike},
};

pub(super) type DurationFn<T> = dyn Fn(&T) -> Result<Observable<()>, RxError> + Send + Sync;
type WindowFn<L, R, V> = dyn Fn(L, Observable<R>) -> Result<V, RxError> + Send + Sync;

pub(super) fn erase<T, D: Send + 'static>(
  f: impl Fn(&T) -> Result<Observable<D>, RxError> + Send + Sync + 'static,
) -> Arc<DurationFn<T>> {
  Arc::new(move |v: &T| f(v).map(|d| d.map(|_| ())))
}

/// Listens to a duration observable; the first value or the completion
/// closes the lifetime.
struct DurationObserver {
  expire: Option<Box<dyn FnOnce() + Send>>,
  fail: Option<Box<dyn FnOnce(RxError) + Send>>,
}

impl Observer<()> for DurationObserver {
  fn next(&mut self, _: ()) { self.complete() }

  fn error(&mut self, err: RxError) {
    self.expire = None;
    if let Some(fail) = self.fail.take() {
      fail(err);
    }
  }

  fn complete(&mut self) {
    self.fail = None;
    if let Some(expire) = self.expire.take() {
      expire();
    }
  }

  fn is_closed(&self) -> bool { self.expire.is_none() }
}

/// Subscribes `duration` inside `group`; the subscription leaves the group
/// once it has expired.
pub(super) fn watch(
  group: &CompositeSubscription, duration: Observable<()>, scheduler: Option<SchedulerRef>,
  expire: impl FnOnce() + Send + 'static, fail: impl FnOnce(RxError) + Send + 'static,
) {
  let holder = SingleSubscription::new();
  let handle: Subscription = holder.clone().into();
  group.add(handle.clone());
  let members = group.clone();
  let observer = DurationObserver {
    expire: Some(Box::new(move || {
      expire();
      members.remove(&handle);
    })),
    fail: Some(Box::new(fail)),
  };
  holder.set(duration.subscribe_gated(Box::new(observer), scheduler));
}

impl<L: Clone + Send + Sync + 'static> Observable<L> {
  /// Pairs every left value with every value of `right` whose lifetime
  /// overlaps its own. The output completes once one side has completed
  /// and all of its values have expired, or both sides have completed.
  pub fn join<R, DL, DR>(
    &self, right: Observable<R>, left_duration: impl Fn(&L) -> Observable<DL> + Send + Sync + 'static,
    right_duration: impl Fn(&R) -> Observable<DR> + Send + Sync + 'static,
  ) -> Observable<(L, R)>
  where
    R: Clone + Send + Sync + 'static,
    DL: Send + 'static,
    DR: Send + 'static,
  {
    self.try_join(right, move |l| Ok(left_duration(l)), move |r| Ok(right_duration(r)))
  }

  pub fn try_join<R, DL, DR>(
    &self, right: Observable<R>,
    left_duration: impl Fn(&L) -> Result<Observable<DL>, RxError> + Send + Sync + 'static,
    right_duration: impl Fn(&R) -> Result<Observable<DR>, RxError> + Send + Sync + 'static,
  ) -> Observable<(L, R)>
  where
    R: Clone + Send + Sync + 'static,
    DL: Send + 'static,
    DR: Send + 'static,
  {
    Observable::new(JoinOp {
      left: self.clone(),
      right,
      left_duration: erase(left_duration),
      right_duration: erase(right_duration),
    })
  }

  /// Opens a window for every left value that carries the right values
  /// overlapping its lifetime, right values already open included. The
  /// output value is `combiner(left, window)`. Windows complete when their
  /// left value expires; an error reaches every open window before the
  /// output.
  pub fn group_join<R, DL, DR, V>(
    &self, right: Observable<R>, left_duration: impl Fn(&L) -> Observable<DL> + Send + Sync + 'static,
    right_duration: impl Fn(&R) -> Observable<DR> + Send + Sync + 'static,
    combiner: impl Fn(L, Observable<R>) -> V + Send + Sync + 'static,
  ) -> Observable<V>
  where
    R: Clone + Send + Sync + 'static,
    DL: Send + 'static,
    DR: Send + 'static,
    V: Send + 'static,
  {
    self.try_group_join(
      right,
      move |l| Ok(left_duration(l)),
      move |r| Ok(right_duration(r)),
      move |l, window| Ok(combiner(l, window)),
    )
  }

  pub fn try_group_join<R, DL, DR, V>(
    &self, right: Observable<R>,
    left_duration: impl Fn(&L) -> Result<Observable<DL>, RxError> + Send + Sync + 'static,
    right_duration: impl Fn(&R) -> Result<Observable<DR>, RxError> + Send + Sync + 'static,
    combiner: impl Fn(L, Observable<R>) -> Result<V, RxError> + Send + Sync + 'static,
  ) -> Observable<V>
  where
    R: Clone + Send + Sync + 'static,
    DL: Send + 'static,
    DR: Send + 'static,
    V: Send + 'static,
  {
    Observable::new(GroupJoinOp {
      left: self.clone(),
      right,
      left_duration: erase(left_duration),
      right_duration: erase(right_duration),
      combiner: Arc::new(combiner),
    })
  }
}

// ---- join ----

struct JoinOp<L, R> {
  left: Observable<L>,
  right: Observable<R>,
  left_duration: Arc<DurationFn<L>>,
  right_duration: Arc<DurationFn<R>>,
}

struct Join<L, R> {
  observer: Subscriber<(L, R)>,
  group: CompositeSubscription,
  scheduler: Option<SchedulerRef>,
  left_duration: Arc<DurationFn<L>>,
  right_duration: Arc<DurationFn<R>>,
  state: Mutex<JoinState<L, R>>,
}

struct JoinState<L, R> {
  lefts: BTreeMap<u64, L>,
  rights: BTreeMap<u64, R>,
  next_id: u64,
  left_done: bool,
  right_done: bool,
}

struct JoinLeft<L, R>(Arc<Join<L, R>>);
struct JoinRight<L, R>(Arc<Join<L, R>>);

impl<L, R> CoreObservable<(L, R)> for JoinOp<L, R>
where
  L: Clone + Send + Sync + 'static,
  R: Clone + Send + Sync + 'static,
{
  fn actual_subscribe(&self, observer: BoxedObserver<(L, R)>, scheduler: Option<SchedulerRef>) -> Subscription {
    let join = Arc::new(Join {
      observer: Subscriber::from_boxed(observer),
      group: CompositeSubscription::new(),
      scheduler: scheduler.clone(),
      left_duration: self.left_duration.clone(),
      right_duration: self.right_duration.clone(),
      state: Mutex::new(JoinState {
        lefts: BTreeMap::new(),
        rights: BTreeMap::new(),
        next_id: 0,
        left_done: false,
        right_done: false,
      }),
    });
    let left = SingleSubscription::new();
    join.group.add(left.clone().into());
    left.set(self.left.subscribe_gated(Box::new(JoinLeft(join.clone())), scheduler.clone()));
    let right = SingleSubscription::new();
    join.group.add(right.clone().into());
    right.set(self.right.subscribe_gated(Box::new(JoinRight(join.clone())), scheduler));

    let observer = join.observer.clone();
    let group = join.group.clone();
    Subscription::new(move || {
      observer.unsubscribe();
      group.unsubscribe();
    })
  }
}

impl<L, R> Join<L, R>
where
  L: Clone + Send + Sync + 'static,
  R: Clone + Send + Sync + 'static,
{
  fn fail(&self, err: RxError) {
    self.observer.clone().error(err);
    self.group.unsubscribe();
  }

  fn complete(&self) {
    self.observer.clone().complete();
    self.group.unsubscribe();
  }

  fn on_left(self: &Arc<Self>, value: L) {
    let (id, rights) = {
      let mut state = self.state.lock();
      let id = state.next_id;
      state.next_id += 1;
      state.lefts.insert(id, value.clone());
      (id, state.rights.values().cloned().collect::<Vec<_>>())
    };
    let duration = match (self.left_duration)(&value) {
      Ok(duration) => duration,
      Err(err) => return self.fail(err),
    };
    let (join, failing) = (self.clone(), self.clone());
    watch(
      &self.group,
      duration,
      self.scheduler.clone(),
      move || {
        let done = {
          let mut state = join.state.lock();
          state.lefts.remove(&id);
          state.lefts.is_empty() && state.left_done
        };
        if done {
          join.complete();
        }
      },
      move |err| failing.fail(err),
    );
    let mut observer = self.observer.clone();
    for r in rights {
      observer.next((value.clone(), r));
    }
  }

  fn on_right(self: &Arc<Self>, value: R) {
    let (id, lefts) = {
      let mut state = self.state.lock();
      let id = state.next_id;
      state.next_id += 1;
      state.rights.insert(id, value.clone());
      (id, state.lefts.values().cloned().collect::<Vec<_>>())
    };
    let duration = match (self.right_duration)(&value) {
      Ok(duration) => duration,
      Err(err) => return self.fail(err),
    };
    let (join, failing) = (self.clone(), self.clone());
    watch(
      &self.group,
      duration,
      self.scheduler.clone(),
      move || {
        let done = {
          let mut state = join.state.lock();
          state.rights.remove(&id);
          state.rights.is_empty() && state.right_done
        };
        if done {
          join.complete();
        }
      },
      move |err| failing.fail(err),
    );
    let mut observer = self.observer.clone();
    for l in lefts {
      observer.next((l, value.clone()));
    }
  }
}

impl<L, R> Observer<L> for JoinLeft<L, R>
where
  L: Clone + Send + Sync + 'static,
  R: Clone + Send + Sync + 'static,
{
  fn next(&mut self, value: L) { self.0.on_left(value) }

  fn error(&mut self, err: RxError) { self.0.fail(err) }

  fn complete(&mut self) {
    let done = {
      let mut state = self.0.state.lock();
      state.left_done = true;
      state.right_done || state.lefts.is_empty()
    };
    if done {
      self.0.complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

impl<L, R> Observer<R> for JoinRight<L, R>
where
  L: Clone + Send + Sync + 'static,
  R: Clone + Send + Sync + 'static,
{
  fn next(&mut self, value: R) { self.0.on_right(value) }

  fn error(&mut self, err: RxError) { self.0.fail(err) }

  fn complete(&mut self) {
    let done = {
      let mut state = self.0.state.lock();
      state.right_done = true;
      state.left_done || state.rights.is_empty()
    };
    if done {
      self.0.complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

// ---- group_join ----

struct GroupJoinOp<L, R, V> {
  left: Observable<L>,
  right: Observable<R>,
  left_duration: Arc<DurationFn<L>>,
  right_duration: Arc<DurationFn<R>>,
  combiner: Arc<WindowFn<L, R, V>>,
}

struct GroupJoin<L, R, V> {
  observer: Subscriber<V>,
  group: CompositeSubscription,
  ref_count: RefCountSubscription,
  scheduler: Option<SchedulerRef>,
  left_duration: Arc<DurationFn<L>>,
  right_duration: Arc<DurationFn<R>>,
  combiner: Arc<WindowFn<L, R, V>>,
  state: Mutex<GroupJoinState<R>>,
}

struct GroupJoinState<R> {
  windows: BTreeMap<u64, Subject<R>>,
  rights: BTreeMap<u64, R>,
  next_id: u64,
}

struct GroupJoinLeft<L, R, V>(Arc<GroupJoin<L, R, V>>);
struct GroupJoinRight<L, R, V>(Arc<GroupJoin<L, R, V>>);

impl<L, R, V> CoreObservable<V> for GroupJoinOp<L, R, V>
where
  L: Clone + Send + Sync + 'static,
  R: Clone + Send + Sync + 'static,
  V: Send + 'static,
{
  fn actual_subscribe(&self, observer: BoxedObserver<V>, scheduler: Option<SchedulerRef>) -> Subscription {
    let group = CompositeSubscription::new();
    let ref_count = RefCountSubscription::new(group.clone().into());
    let join = Arc::new(GroupJoin {
      observer: Subscriber::from_boxed(observer),
      group,
      ref_count: ref_count.clone(),
      scheduler: scheduler.clone(),
      left_duration: self.left_duration.clone(),
      right_duration: self.right_duration.clone(),
      combiner: self.combiner.clone(),
      state: Mutex::new(GroupJoinState { windows: BTreeMap::new(), rights: BTreeMap::new(), next_id: 0 }),
    });
    let left = SingleSubscription::new();
    join.group.add(left.clone().into());
    left.set(self.left.subscribe_gated(Box::new(GroupJoinLeft(join.clone())), scheduler.clone()));
    let right = SingleSubscription::new();
    join.group.add(right.clone().into());
    right.set(self.right.subscribe_gated(Box::new(GroupJoinRight(join.clone())), scheduler));

    let observer = join.observer.clone();
    Subscription::new(move || {
      observer.unsubscribe();
      ref_count.unsubscribe();
    })
  }
}

impl<L, R, V> GroupJoin<L, R, V>
where
  L: Clone + Send + Sync + 'static,
  R: Clone + Send + Sync + 'static,
  V: Send + 'static,
{
  fn fail(&self, err: RxError) {
    let windows = std::mem::take(&mut self.state.lock().windows);
    for mut window in windows.into_values() {
      window.error(err.clone());
    }
    self.observer.clone().error(err);
    self.group.unsubscribe();
  }

  fn on_left(self: &Arc<Self>, value: L) {
    let subject = Subject::new();
    let (id, rights) = {
      let mut state = self.state.lock();
      let id = state.next_id;
      state.next_id += 1;
      state.windows.insert(id, subject.clone());
      (id, state.rights.values().cloned().collect::<Vec<_>>())
    };
    let window = add_ref(subject.as_observable(), &self.ref_count);
    match (self.combiner)(value.clone(), window) {
      Ok(v) => self.observer.clone().next(v),
      Err(err) => return self.fail(err),
    }
    let mut sink = subject;
    for r in rights {
      sink.next(r);
    }

    let duration = match (self.left_duration)(&value) {
      Ok(duration) => duration,
      Err(err) => return self.fail(err),
    };
    let (join, failing) = (self.clone(), self.clone());
    watch(
      &self.group,
      duration,
      self.scheduler.clone(),
      move || {
        let window = join.state.lock().windows.remove(&id);
        if let Some(mut window) = window {
          window.complete();
        }
      },
      move |err| failing.fail(err),
    );
  }

  fn on_right(self: &Arc<Self>, value: R) {
    let (id, windows) = {
      let mut state = self.state.lock();
      let id = state.next_id;
      state.next_id += 1;
      state.rights.insert(id, value.clone());
      (id, state.windows.values().cloned().collect::<Vec<_>>())
    };
    let duration = match (self.right_duration)(&value) {
      Ok(duration) => duration,
      Err(err) => return self.fail(err),
    };
    let (join, failing) = (self.clone(), self.clone());
    watch(
      &self.group,
      duration,
      self.scheduler.clone(),
      move || {
        join.state.lock().rights.remove(&id);
      },
      move |err| failing.fail(err),
    );
    for mut window in windows {
      window.next(value.clone());
    }
  }
}

impl<L, R, V> Observer<L> for GroupJoinLeft<L, R, V>
where
  L: Clone + Send + Sync + 'static,
  R: Clone + Send + Sync + 'static,
  V: Send + 'static,
{
  fn next(&mut self, value: L) { self.0.on_left(value) }

  fn error(&mut self, err: RxError) { self.0.fail(err) }

  fn complete(&mut self) { self.0.observer.clone().complete() }

  // open windows keep both sides connected
  fn is_closed(&self) -> bool { self.0.ref_count.is_closed() }
}

impl<L, R, V> Observer<R> for GroupJoinRight<L, R, V>
where
  L: Clone + Send + Sync + 'static,
  R: Clone + Send + Sync + 'static,
  V: Send + 'static,
{
  fn next(&mut self, value: R) { self.0.on_right(value) }

  fn error(&mut self, err: RxError) { self.0.fail(err) }

  fn complete(&mut self) {}

  fn is_closed(&self) -> bool { self.0.ref_count.is_closed() }
}
