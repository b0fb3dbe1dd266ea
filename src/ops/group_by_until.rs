use std::{collections::HashMap, hash::Hash, sync::Arc};

use parking_lot::Mutex;

use super::group_join::{erase, watch, DurationFn};
use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  ops::{add_ref, GroupedObservable},
  scheduler::SchedulerRef,
  subject::Subject,
  subscription::{CompositeSubscription, RefCountSubscription, SingleSubscription, Subscription, SubscriptionLike},
};

type KeyFn<T, K> = dyn Fn(&T) -> Result<K, RxError> + Send + Sync;
type ElementFn<T, U> = dyn Fn(T) -> Result<U, RxError> + Send + Sync;

struct GroupByUntilOp<T, K, U> {
  source: Observable<T>,
  key: Arc<KeyFn<T, K>>,
  element: Arc<ElementFn<T, U>>,
  duration: Arc<DurationFn<GroupedObservable<K, U>>>,
}

struct GroupByUntil<K, U> {
  observer: Subscriber<GroupedObservable<K, U>>,
  ref_count: RefCountSubscription,
  durations: CompositeSubscription,
  duration: Arc<DurationFn<GroupedObservable<K, U>>>,
  scheduler: Option<SchedulerRef>,
  state: Mutex<UntilState<K, U>>,
}

struct UntilState<K, U> {
  groups: HashMap<K, Subject<U>>,
  done: bool,
}

struct GroupByUntilObserver<T, K, U> {
  shared: Arc<GroupByUntil<K, U>>,
  key: Arc<KeyFn<T, K>>,
  element: Arc<ElementFn<T, U>>,
}

impl<T: Send + 'static> Observable<T> {
  /// [`group_by`](Self::group_by) where every group lives only until the
  /// observable returned by `duration` for it emits or completes. The
  /// expired group completes; a later value with the same key opens a new
  /// group.
  pub fn group_by_until<K, D>(
    &self, key: impl Fn(&T) -> K + Send + Sync + 'static,
    duration: impl Fn(&GroupedObservable<K, T>) -> Observable<D> + Send + Sync + 'static,
  ) -> Observable<GroupedObservable<K, T>>
  where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Sync,
    D: Send + 'static,
  {
    self.try_group_by_until_with(move |v| Ok(key(v)), Ok, move |g| Ok(duration(g)))
  }

  pub fn try_group_by_until_with<K, U, D>(
    &self, key: impl Fn(&T) -> Result<K, RxError> + Send + Sync + 'static,
    element: impl Fn(T) -> Result<U, RxError> + Send + Sync + 'static,
    duration: impl Fn(&GroupedObservable<K, U>) -> Result<Observable<D>, RxError> + Send + Sync + 'static,
  ) -> Observable<GroupedObservable<K, U>>
  where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    D: Send + 'static,
  {
    Observable::new(GroupByUntilOp {
      source: self.clone(),
      key: Arc::new(key),
      element: Arc::new(element),
      duration: erase(duration),
    })
  }
}

impl<T, K, U> CoreObservable<GroupedObservable<K, U>> for GroupByUntilOp<T, K, U>
where
  T: Send + 'static,
  K: Clone + Eq + Hash + Send + Sync + 'static,
  U: Clone + Send + Sync + 'static,
{
  fn actual_subscribe(
    &self, observer: BoxedObserver<GroupedObservable<K, U>>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let source = SingleSubscription::new();
    let durations = CompositeSubscription::new();
    let underlying = {
      let (source, durations) = (source.clone(), durations.clone());
      Subscription::new(move || {
        source.unsubscribe();
        durations.unsubscribe();
      })
    };
    let ref_count = RefCountSubscription::new(underlying);
    let shared = Arc::new(GroupByUntil {
      observer: Subscriber::from_boxed(observer),
      ref_count: ref_count.clone(),
      durations,
      duration: self.duration.clone(),
      scheduler: scheduler.clone(),
      state: Mutex::new(UntilState { groups: HashMap::new(), done: false }),
    });
    let observer = GroupByUntilObserver { shared, key: self.key.clone(), element: self.element.clone() };
    source.set(self.source.subscribe_gated(Box::new(observer), scheduler));
    ref_count.into()
  }
}

impl<K, U> GroupByUntil<K, U>
where
  K: Clone + Eq + Hash + Send + Sync + 'static,
  U: Clone + Send + Sync + 'static,
{
  fn is_done(&self) -> bool { self.state.lock().done }

  /// The group for `key`, and whether it was just opened.
  fn group_for(&self, key: &K) -> (Subject<U>, bool) {
    let mut state = self.state.lock();
    match state.groups.get(key) {
      Some(group) => (group.clone(), false),
      None => {
        let group = Subject::new();
        state.groups.insert(key.clone(), group.clone());
        (group, true)
      }
    }
  }

  fn open(self: &Arc<Self>, key: K, group: &Subject<U>) -> Result<(), RxError> {
    let duration = (self.duration)(&GroupedObservable::new(key.clone(), group.as_observable()))?;
    let observable = add_ref(group.as_observable(), &self.ref_count);
    self.observer.clone().next(GroupedObservable::new(key.clone(), observable));
    let (expiring, failing) = (self.clone(), self.clone());
    let mut expired = group.clone();
    watch(
      &self.durations,
      duration,
      self.scheduler.clone(),
      move || {
        let removed = expiring.state.lock().groups.remove(&key).is_some();
        if removed {
          expired.complete();
        }
      },
      move |err| failing.fail(err),
    );
    Ok(())
  }

  fn drain(&self) -> Option<Vec<Subject<U>>> {
    let mut state = self.state.lock();
    if state.done {
      return None;
    }
    state.done = true;
    Some(state.groups.drain().map(|(_, g)| g).collect())
  }

  fn fail(&self, err: RxError) {
    if let Some(groups) = self.drain() {
      for mut group in groups {
        group.error(err.clone());
      }
      self.observer.clone().error(err);
      self.durations.unsubscribe();
    }
  }

  fn complete(&self) {
    if let Some(groups) = self.drain() {
      for mut group in groups {
        group.complete();
      }
      self.observer.clone().complete();
      self.durations.unsubscribe();
    }
  }
}

impl<T, K, U> Observer<T> for GroupByUntilObserver<T, K, U>
where
  K: Clone + Eq + Hash + Send + Sync + 'static,
  U: Clone + Send + Sync + 'static,
{
  fn next(&mut self, value: T) {
    if self.shared.is_done() {
      return;
    }
    let key = match (self.key)(&value) {
      Ok(key) => key,
      Err(err) => return self.shared.fail(err),
    };
    let (mut group, fresh) = self.shared.group_for(&key);
    if fresh {
      if let Err(err) = self.shared.open(key, &group) {
        return self.shared.fail(err);
      }
    }
    match (self.element)(value) {
      Ok(element) => group.next(element),
      Err(err) => self.shared.fail(err),
    }
  }

  fn error(&mut self, err: RxError) { self.shared.fail(err) }

  fn complete(&mut self) { self.shared.complete() }

  fn is_closed(&self) -> bool { self.shared.is_done() || self.shared.ref_count.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::{
    notification::Notification,
    ops::GroupedObservable,
    testing::{ReactiveTest, TestScheduler},
  };

  #[rxkit_macro::test]
  fn expired_groups_complete_and_reopen() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(220, 2),
      ReactiveTest::on_next(230, 3),
      ReactiveTest::on_next(260, 5),
      ReactiveTest::on_next(290, 7),
      ReactiveTest::on_next(300, 4),
      ReactiveTest::on_next(310, 9),
      ReactiveTest::on_completed(400),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || {
      src.group_by_until(|v| v % 2, |g: &GroupedObservable<i32, i32>| g.skip(1)).flat_map(|g| {
        let key = *g.key();
        g.to_list().map(move |values| (key, values))
      })
    });
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(230, (1, vec![1, 3])),
        ReactiveTest::on_next(290, (1, vec![5, 7])),
        ReactiveTest::on_next(300, (0, vec![2, 4])),
        ReactiveTest::on_next(400, (1, vec![9])),
        ReactiveTest::on_completed(400),
      ]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 400)]);
  }

  #[rxkit_macro::test]
  fn duration_error_fails_every_group() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(220, 2),
      ReactiveTest::on_next(230, 3),
      ReactiveTest::on_completed(300),
    ]);
    let ds = scheduler.create_hot_observable::<i32>(vec![ReactiveTest::on_error(250, "ex")]);
    let (src, durations) = (xs.as_observable(), ds.as_observable());
    let res = scheduler.start(move || {
      src
        .group_by_until(|v| v % 2, move |_: &GroupedObservable<i32, i32>| durations.clone())
        .flat_map(|g| g.into_observable().materialize())
    });
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(210, Notification::Next(1)),
        ReactiveTest::on_next(220, Notification::Next(2)),
        ReactiveTest::on_next(230, Notification::Next(3)),
        ReactiveTest::on_next(250, Notification::Error("ex".into())),
        ReactiveTest::on_next(250, Notification::Error("ex".into())),
        ReactiveTest::on_error(250, "ex"),
      ]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 250)]);
  }
}
