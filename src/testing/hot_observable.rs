use std::sync::Arc;

use parking_lot::Mutex;

use super::{Recorded, SubscriptionRecord};
use crate::{
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Subscriber},
  scheduler::{SchedulerRef, VirtualTimeScheduler},
  subscription::Subscription,
};

/// Emits its messages at their absolute virtual times, to whoever is
/// subscribed at that moment.
pub struct HotObservable<T> {
  inner: Arc<HotInner<T>>,
}

struct HotInner<T> {
  scheduler: VirtualTimeScheduler,
  observers: Mutex<HotObservers<T>>,
  subscriptions: Mutex<Vec<SubscriptionRecord>>,
}

struct HotObservers<T> {
  next_id: usize,
  list: Vec<(usize, Subscriber<T>)>,
}

impl<T> Clone for HotObservable<T> {
  fn clone(&self) -> Self { HotObservable { inner: self.inner.clone() } }
}

impl<T: Clone + Send + Sync + 'static> HotObservable<T> {
  pub(crate) fn new(scheduler: VirtualTimeScheduler, messages: Vec<Recorded<T>>) -> Self {
    let inner = Arc::new(HotInner {
      scheduler: scheduler.clone(),
      observers: Mutex::new(HotObservers { next_id: 0, list: vec![] }),
      subscriptions: Mutex::new(vec![]),
    });
    for Recorded { time, value } in messages {
      let inner = inner.clone();
      scheduler.schedule_at(time, move || {
        let snapshot: Vec<_> = inner.observers.lock().list.iter().map(|(_, s)| s.clone()).collect();
        for mut observer in snapshot {
          value.clone().accept(&mut observer);
        }
      });
    }
    HotObservable { inner }
  }

  pub fn as_observable(&self) -> Observable<T> { Observable::new(self.clone()) }

  pub fn subscriptions(&self) -> Vec<SubscriptionRecord> { self.inner.subscriptions.lock().clone() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for HotObservable<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, _: Option<SchedulerRef>) -> Subscription {
    let subscriber = Subscriber::from_boxed(observer);
    let id = {
      let mut observers = self.inner.observers.lock();
      let id = observers.next_id;
      observers.next_id += 1;
      observers.list.push((id, subscriber.clone()));
      id
    };
    let index = {
      let mut records = self.inner.subscriptions.lock();
      records.push(SubscriptionRecord::new(self.inner.scheduler.clock(), SubscriptionRecord::INFINITE));
      records.len() - 1
    };
    let inner = self.inner.clone();
    Subscription::new(move || {
      inner.observers.lock().list.retain(|(i, _)| *i != id);
      subscriber.unsubscribe();
      let now = inner.scheduler.clock();
      inner.subscriptions.lock()[index].unsubscribe = now;
    })
  }
}
