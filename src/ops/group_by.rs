use std::{collections::HashMap, hash::Hash, ops::Deref, sync::Arc};

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  ops::add_ref,
  scheduler::SchedulerRef,
  subject::Subject,
  subscription::{RefCountSubscription, SingleSubscription, Subscription, SubscriptionLike},
};

/// One group of a [`group_by`](Observable::group_by): the values that share
/// `key`. Dereferences to the group's observable.
pub struct GroupedObservable<K, T> {
  key: K,
  observable: Observable<T>,
}

impl<K: Clone, T> Clone for GroupedObservable<K, T> {
  fn clone(&self) -> Self { GroupedObservable { key: self.key.clone(), observable: self.observable.clone() } }
}

impl<K, T> GroupedObservable<K, T> {
  pub(super) fn new(key: K, observable: Observable<T>) -> Self { GroupedObservable { key, observable } }

  pub fn key(&self) -> &K { &self.key }

  pub fn into_observable(self) -> Observable<T> { self.observable }
}

impl<K, T> Deref for GroupedObservable<K, T> {
  type Target = Observable<T>;

  fn deref(&self) -> &Observable<T> { &self.observable }
}

type KeyFn<T, K> = dyn Fn(&T) -> Result<K, RxError> + Send + Sync;
type ElementFn<T, U> = dyn Fn(T) -> Result<U, RxError> + Send + Sync;

struct GroupByOp<T, K, U> {
  source: Observable<T>,
  key: Arc<KeyFn<T, K>>,
  element: Arc<ElementFn<T, U>>,
}

struct GroupByObserver<T, K, U> {
  observer: BoxedObserver<GroupedObservable<K, U>>,
  key: Arc<KeyFn<T, K>>,
  element: Arc<ElementFn<T, U>>,
  ref_count: RefCountSubscription,
  index: HashMap<K, usize>,
  groups: Vec<Subject<U>>,
  done: bool,
}

impl<T: Send + 'static> Observable<T> {
  /// Splits the source into one [`GroupedObservable`] per distinct key. A
  /// group is emitted when the first value of its key arrives; every group
  /// terminates with the source.
  pub fn group_by<K>(&self, key: impl Fn(&T) -> K + Send + Sync + 'static) -> Observable<GroupedObservable<K, T>>
  where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Sync,
  {
    self.try_group_by_with(move |v| Ok(key(v)), Ok)
  }

  pub fn try_group_by<K>(
    &self, key: impl Fn(&T) -> Result<K, RxError> + Send + Sync + 'static,
  ) -> Observable<GroupedObservable<K, T>>
  where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Sync,
  {
    self.try_group_by_with(key, Ok)
  }

  /// [`group_by`](Self::group_by) that also maps every value with
  /// `element` before it enters its group.
  pub fn group_by_with<K, U>(
    &self, key: impl Fn(&T) -> K + Send + Sync + 'static, element: impl Fn(T) -> U + Send + Sync + 'static,
  ) -> Observable<GroupedObservable<K, U>>
  where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
  {
    self.try_group_by_with(move |v| Ok(key(v)), move |v| Ok(element(v)))
  }

  pub fn try_group_by_with<K, U>(
    &self, key: impl Fn(&T) -> Result<K, RxError> + Send + Sync + 'static,
    element: impl Fn(T) -> Result<U, RxError> + Send + Sync + 'static,
  ) -> Observable<GroupedObservable<K, U>>
  where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
  {
    Observable::new(GroupByOp { source: self.clone(), key: Arc::new(key), element: Arc::new(element) })
  }
}

impl<T, K, U> CoreObservable<GroupedObservable<K, U>> for GroupByOp<T, K, U>
where
  T: Send + 'static,
  K: Clone + Eq + Hash + Send + Sync + 'static,
  U: Clone + Send + Sync + 'static,
{
  fn actual_subscribe(
    &self, observer: BoxedObserver<GroupedObservable<K, U>>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let source = SingleSubscription::new();
    let ref_count = RefCountSubscription::new(source.clone().into());
    let observer = GroupByObserver {
      observer,
      key: self.key.clone(),
      element: self.element.clone(),
      ref_count: ref_count.clone(),
      index: HashMap::new(),
      groups: vec![],
      done: false,
    };
    source.set(self.source.subscribe_gated(Box::new(observer), scheduler));
    ref_count.into()
  }
}

impl<T, K, U> GroupByObserver<T, K, U>
where
  K: Clone + Eq + Hash + Send + Sync + 'static,
  U: Clone + Send + Sync + 'static,
{
  fn group_for(&mut self, key: K) -> Subject<U> {
    if let Some(&i) = self.index.get(&key) {
      return self.groups[i].clone();
    }
    let group = Subject::new();
    self.index.insert(key.clone(), self.groups.len());
    self.groups.push(group.clone());
    let observable = add_ref(group.as_observable(), &self.ref_count);
    self.observer.next(GroupedObservable::new(key, observable));
    group
  }

  fn fail(&mut self, err: RxError) {
    self.done = true;
    self.index.clear();
    for mut group in self.groups.drain(..) {
      group.error(err.clone());
    }
    self.observer.error(err);
  }
}

impl<T, K, U> Observer<T> for GroupByObserver<T, K, U>
where
  K: Clone + Eq + Hash + Send + Sync + 'static,
  U: Clone + Send + Sync + 'static,
{
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    let key = match (self.key)(&value) {
      Ok(key) => key,
      Err(err) => return self.fail(err),
    };
    let mut group = self.group_for(key);
    match (self.element)(value) {
      Ok(element) => group.next(element),
      Err(err) => self.fail(err),
    }
  }

  fn error(&mut self, err: RxError) { self.fail(err) }

  fn complete(&mut self) {
    self.index.clear();
    for mut group in self.groups.drain(..) {
      group.complete();
    }
    self.observer.complete();
  }

  // groups may still be observed after the outer observer is gone
  fn is_closed(&self) -> bool { self.done || self.ref_count.is_closed() }
}
