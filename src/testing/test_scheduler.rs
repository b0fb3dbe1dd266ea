use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use super::{ColdObservable, HotObservable, MockObserver, ReactiveTest, Recorded};
use crate::{
  error::RxError,
  observable::Observable,
  scheduler::{Action, Scheduler, SchedulerRef, VirtualTimeScheduler},
  subscription::Subscription,
};

/// Virtual times at which [`TestScheduler::start_with_timing`] creates,
/// subscribes and disposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
  pub created: u64,
  pub subscribed: u64,
  pub disposed: u64,
}

impl Default for Timing {
  fn default() -> Self {
    Timing {
      created: ReactiveTest::CREATED,
      subscribed: ReactiveTest::SUBSCRIBED,
      disposed: ReactiveTest::DISPOSED,
    }
  }
}

/// A virtual-time scheduler with helpers for writing operator tests.
#[derive(Clone, Debug, Default)]
pub struct TestScheduler {
  vts: VirtualTimeScheduler,
}

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  pub fn clock(&self) -> u64 { self.vts.clock() }

  pub fn virtual_time(&self) -> &VirtualTimeScheduler { &self.vts }

  /// This scheduler as a trait object, for `subscribe_with` and operators
  /// that take an explicit scheduler.
  pub fn as_scheduler(&self) -> SchedulerRef { Arc::new(self.clone()) }

  pub fn schedule_at(&self, time: u64, action: impl FnOnce() + Send + 'static) -> Subscription {
    self.vts.schedule_at(time, action)
  }

  pub fn advance_to(&self, time: u64) -> Result<(), RxError> { self.vts.advance_to(time) }

  pub fn advance_by(&self, delta: u64) -> Result<(), RxError> { self.vts.advance_by(delta) }

  /// Runs the virtual clock until nothing is left to do.
  pub fn start_scheduler(&self) { self.vts.start() }

  pub fn stop(&self) { self.vts.stop() }

  pub fn create_observer<T>(&self) -> MockObserver<T> { MockObserver::new(self.vts.clone()) }

  pub fn create_hot_observable<T: Clone + Send + Sync + 'static>(
    &self, messages: Vec<Recorded<T>>,
  ) -> HotObservable<T> {
    HotObservable::new(self.vts.clone(), messages)
  }

  pub fn create_cold_observable<T: Clone + Send + Sync + 'static>(
    &self, messages: Vec<Recorded<T>>,
  ) -> ColdObservable<T> {
    ColdObservable::new(self.vts.clone(), messages)
  }

  /// Creates the observable at 100, subscribes at 200 and disposes at 1000,
  /// then runs the clock to the end.
  pub fn start<T, F>(&self, create: F) -> MockObserver<T>
  where
    T: Send + 'static,
    F: FnOnce() -> Observable<T> + Send + 'static,
  {
    self.start_with_timing(create, Timing::default())
  }

  pub fn start_with_timing<T, F>(&self, create: F, timing: Timing) -> MockObserver<T>
  where
    T: Send + 'static,
    F: FnOnce() -> Observable<T> + Send + 'static,
  {
    let observer = self.create_observer::<T>();
    let source: Arc<Mutex<Option<Observable<T>>>> = Arc::default();
    let subscription: Arc<Mutex<Option<Subscription>>> = Arc::default();

    let created = source.clone();
    self.schedule_at(timing.created, move || *created.lock() = Some(create()));

    let (to_subscribe, slot, mock, scheduler) =
      (source, subscription.clone(), observer.clone(), self.as_scheduler());
    self.schedule_at(timing.subscribed, move || {
      let source = to_subscribe.lock().clone();
      if let Some(source) = source {
        let handle = source.subscribe_with(mock, Some(scheduler));
        *slot.lock() = Some(handle);
      }
    });

    self.schedule_at(timing.disposed, move || {
      let handle = subscription.lock().take();
      if let Some(handle) = handle {
        handle.unsubscribe();
      }
    });

    self.start_scheduler();
    observer
  }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Duration { self.vts.now() }

  fn schedule_relative(&self, delay: Duration, action: Action) -> Subscription {
    self.vts.schedule_relative(delay, action)
  }

  fn schedule_absolute(&self, due: Duration, action: Action) -> Subscription {
    self.vts.schedule_absolute(due, action)
  }
}
