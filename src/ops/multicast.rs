use std::time::Duration;

use crate::{
  observable::{ConnectableObservable, Observable, SubjectLike},
  scheduler::SchedulerRef,
  subject::{BehaviorSubject, ReplaySubject, Subject},
};

impl<T: Clone + Send + Sync + 'static> Observable<T> {
  /// Shares one subscription to `self` through `subject`. Nothing is
  /// subscribed until [`connect`](ConnectableObservable::connect).
  pub fn multicast(&self, subject: impl SubjectLike<T>) -> ConnectableObservable<T> {
    ConnectableObservable::new(self.clone(), subject)
  }

  /// [`multicast`](Self::multicast) through a plain [`Subject`].
  pub fn publish(&self) -> ConnectableObservable<T> { self.multicast(Subject::new()) }

  /// [`multicast`](Self::multicast) through a [`BehaviorSubject`] holding
  /// `initial` until the first value arrives.
  pub fn publish_value(&self, initial: T) -> ConnectableObservable<T> { self.multicast(BehaviorSubject::new(initial)) }

  /// [`multicast`](Self::multicast) through a [`ReplaySubject`]: late
  /// subscribers first get up to `buffer_size` values no older than
  /// `window`.
  pub fn replay(&self, buffer_size: Option<usize>, window: Option<Duration>) -> ConnectableObservable<T> {
    self.replay_on(buffer_size, window, None)
  }

  /// [`replay`](Self::replay) with the clock used to age the buffer.
  pub fn replay_on(
    &self, buffer_size: Option<usize>, window: Option<Duration>, scheduler: Option<SchedulerRef>,
  ) -> ConnectableObservable<T> {
    self.multicast(ReplaySubject::new(buffer_size, window, scheduler))
  }

  /// `publish().ref_count()`: connected while at least one subscriber is
  /// attached.
  pub fn share(&self) -> Observable<T> { self.publish().ref_count() }
}
