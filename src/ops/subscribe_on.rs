use crate::{
  observable::{CoreObservable, Observable},
  observer::BoxedObserver,
  scheduler::SchedulerRef,
  subscription::{ScheduledSubscription, SingleSubscription, Subscription, SubscriptionLike},
};

impl<T: Send + 'static> Observable<T> {
  /// Subscribes to the source from a task on `scheduler`, and unsubscribes
  /// from it there as well.
  pub fn subscribe_on(&self, scheduler: SchedulerRef) -> Observable<T> {
    Observable::new(SubscribeOnOp { source: self.clone(), scheduler })
  }
}

struct SubscribeOnOp<T> {
  source: Observable<T>,
  scheduler: SchedulerRef,
}

impl<T: Send + 'static> CoreObservable<T> for SubscribeOnOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let holder = SingleSubscription::new();
    let (source, on, slot) = (self.source.clone(), self.scheduler.clone(), holder.clone());
    let task = self.scheduler.schedule(Box::new(move || {
      let inner = source.actual_subscribe(observer, scheduler);
      slot.set(ScheduledSubscription::new(on, inner).into());
    }));
    Subscription::new(move || {
      task.unsubscribe();
      holder.unsubscribe();
    })
  }
}
