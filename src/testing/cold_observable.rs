use std::sync::Arc;

use parking_lot::Mutex;

use super::{Recorded, SubscriptionRecord};
use crate::{
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Subscriber},
  scheduler::{SchedulerRef, VirtualTimeScheduler},
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

/// Replays its messages for every subscriber, with times taken relative to
/// the moment of subscription.
pub struct ColdObservable<T> {
  inner: Arc<ColdInner<T>>,
}

struct ColdInner<T> {
  scheduler: VirtualTimeScheduler,
  messages: Vec<Recorded<T>>,
  subscriptions: Mutex<Vec<SubscriptionRecord>>,
}

impl<T> Clone for ColdObservable<T> {
  fn clone(&self) -> Self { ColdObservable { inner: self.inner.clone() } }
}

impl<T: Clone + Send + Sync + 'static> ColdObservable<T> {
  pub(crate) fn new(scheduler: VirtualTimeScheduler, messages: Vec<Recorded<T>>) -> Self {
    ColdObservable {
      inner: Arc::new(ColdInner { scheduler, messages, subscriptions: Mutex::new(vec![]) }),
    }
  }

  pub fn as_observable(&self) -> Observable<T> { Observable::new(self.clone()) }

  pub fn subscriptions(&self) -> Vec<SubscriptionRecord> { self.inner.subscriptions.lock().clone() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for ColdObservable<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, _: Option<SchedulerRef>) -> Subscription {
    let subscriber = Subscriber::from_boxed(observer);
    let index = {
      let mut records = self.inner.subscriptions.lock();
      records.push(SubscriptionRecord::new(self.inner.scheduler.clock(), SubscriptionRecord::INFINITE));
      records.len() - 1
    };
    let pending = CompositeSubscription::new();
    for Recorded { time, value } in self.inner.messages.iter().cloned() {
      let mut observer = subscriber.clone();
      pending.add(self.inner.scheduler.schedule_after(time, move || value.accept(&mut observer)));
    }
    let inner = self.inner.clone();
    Subscription::new(move || {
      pending.unsubscribe();
      subscriber.unsubscribe();
      let now = inner.scheduler.clock();
      inner.subscriptions.lock()[index].unsubscribe = now;
    })
  }
}
