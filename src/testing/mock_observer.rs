use std::sync::Arc;

use parking_lot::Mutex;

use super::Recorded;
use crate::{
  error::RxError, notification::Notification, observer::Observer,
  scheduler::VirtualTimeScheduler,
};

/// Records every notification together with the virtual time it arrived.
pub struct MockObserver<T> {
  scheduler: VirtualTimeScheduler,
  messages: Arc<Mutex<Vec<Recorded<T>>>>,
}

impl<T> Clone for MockObserver<T> {
  fn clone(&self) -> Self {
    MockObserver { scheduler: self.scheduler.clone(), messages: self.messages.clone() }
  }
}

impl<T> MockObserver<T> {
  pub(crate) fn new(scheduler: VirtualTimeScheduler) -> Self {
    MockObserver { scheduler, messages: Arc::default() }
  }

  fn record(&self, value: Notification<T>) {
    let time = self.scheduler.clock();
    self.messages.lock().push(Recorded::new(time, value));
  }

  pub fn len(&self) -> usize { self.messages.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<T: Clone> MockObserver<T> {
  pub fn messages(&self) -> Vec<Recorded<T>> { self.messages.lock().clone() }

  /// Only the values of `Next` notifications.
  pub fn values(&self) -> Vec<T> {
    self.messages.lock().iter().filter_map(|r| r.value.value().cloned()).collect()
  }
}

impl<T: Send + 'static> Observer<T> for MockObserver<T> {
  fn next(&mut self, value: T) { self.record(Notification::Next(value)) }

  fn error(&mut self, err: RxError) { self.record(Notification::Error(err)) }

  fn complete(&mut self) { self.record(Notification::Complete) }
}
