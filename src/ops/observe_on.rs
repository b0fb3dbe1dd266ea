use std::{
  collections::VecDeque,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  notification::Notification,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

impl<T: Send + 'static> Observable<T> {
  /// Re-delivers every notification from a task on `scheduler`, one task
  /// per notification, in arrival order.
  pub fn observe_on(&self, scheduler: SchedulerRef) -> Observable<T> {
    Observable::new(ObserveOnOp { source: self.clone(), scheduler })
  }
}

struct ObserveOnOp<T> {
  source: Observable<T>,
  scheduler: SchedulerRef,
}

impl<T: Send + 'static> CoreObservable<T> for ObserveOnOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let scheduled = ScheduledObserver::new(self.scheduler.clone(), Subscriber::from_boxed(observer));
    let handle = scheduled.handle();
    let source = self.source.actual_subscribe(Box::new(scheduled), scheduler);
    Subscription::new(move || {
      source.unsubscribe();
      handle.unsubscribe();
    })
  }
}

/// An observer that queues notifications and drains them on a scheduler,
/// one scheduled task per notification. At most one task is pending at a
/// time, so the order is kept whatever the scheduler.
pub(crate) struct ScheduledObserver<T> {
  inner: Arc<Scheduled<T>>,
}

struct Scheduled<T> {
  scheduler: SchedulerRef,
  observer: Subscriber<T>,
  queue: Mutex<DrainQueue<T>>,
  closed: AtomicBool,
}

struct DrainQueue<T> {
  items: VecDeque<Notification<T>>,
  draining: bool,
}

impl<T: Send + 'static> ScheduledObserver<T> {
  pub(crate) fn new(scheduler: SchedulerRef, observer: Subscriber<T>) -> Self {
    ScheduledObserver {
      inner: Arc::new(Scheduled {
        scheduler,
        observer,
        queue: Mutex::new(DrainQueue { items: VecDeque::new(), draining: false }),
        closed: AtomicBool::new(false),
      }),
    }
  }

  /// Stops the draining and drops whatever is still queued.
  pub(crate) fn handle(&self) -> Subscription {
    let inner = self.inner.clone();
    Subscription::new(move || {
      inner.closed.store(true, Ordering::Release);
      inner.queue.lock().items.clear();
      inner.observer.unsubscribe();
    })
  }
}

impl<T: Send + 'static> Scheduled<T> {
  fn enqueue(self: &Arc<Self>, item: Notification<T>) {
    if self.closed.load(Ordering::Acquire) {
      return;
    }
    let start = {
      let mut queue = self.queue.lock();
      queue.items.push_back(item);
      !std::mem::replace(&mut queue.draining, true)
    };
    if start {
      self.schedule_one();
    }
  }

  fn schedule_one(self: &Arc<Self>) {
    let this = self.clone();
    self.scheduler.schedule(Box::new(move || this.deliver_one()));
  }

  fn deliver_one(self: &Arc<Self>) {
    if self.closed.load(Ordering::Acquire) {
      return;
    }
    let item = self.queue.lock().items.pop_front();
    if let Some(item) = item {
      item.accept(&mut self.observer.clone());
    }
    let more = {
      let mut queue = self.queue.lock();
      queue.draining = !queue.items.is_empty();
      queue.draining
    };
    if more {
      self.schedule_one();
    }
  }
}

impl<T: Send + 'static> Observer<T> for ScheduledObserver<T> {
  fn next(&mut self, value: T) { self.inner.enqueue(Notification::Next(value)) }

  fn error(&mut self, err: RxError) { self.inner.enqueue(Notification::Error(err)) }

  fn complete(&mut self) { self.inner.enqueue(Notification::Complete) }

  fn is_closed(&self) -> bool { self.inner.closed.load(Ordering::Acquire) || self.inner.observer.is_closed() }
}
