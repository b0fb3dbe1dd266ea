//! The [`Observable`] type and the factory functions that create one.
//!
//! An observable is a cheap, cloneable handle to a [`CoreObservable`]. Each
//! call to [`Observable::subscribe`] starts a new subscription; whether that
//! starts a new producer (cold) or joins a shared one (hot) is up to the
//! core.
use std::sync::Arc;

use crate::{
  error::RxError,
  observer::{AutoDetachObserver, BoxedObserver, FnMutObserver, Observer, ObserverFns, Subscriber},
  scheduler::SchedulerRef,
  subscription::{SingleSubscription, Subscription, SubscriptionLike},
};

mod case;
mod concat;
mod connectable;
mod create;
mod defer;
mod fork_join;
mod from_iter;
mod generate;
mod interval;
mod of;
mod trivial;
mod using;
mod while_do;

pub use case::{case, if_then, try_case};
pub use concat::{catch_iter, concat, concat_iter, on_error_resume_next};
pub use connectable::{ConnectableObservable, SubjectLike};
pub use create::{create, try_create};
pub use defer::{defer, try_defer};
pub use fork_join::{fork_join, fork_join_with};
pub use from_iter::{from_iter, range, repeat_value, sequence};
pub use generate::generate;
pub use interval::{interval, timer};
pub use of::{just, of, return_value};
pub use trivial::{empty, never, throw};
pub use using::using;
pub use while_do::{do_while, while_do};

pub use crate::ops::{amb, combine_latest, merge, zip};

/// The producer side of an observable.
///
/// Implementations push into `observer` and return the subscription that
/// stops the production. The observer is already grammar-gated by the
/// caller.
pub trait CoreObservable<T>: Send + Sync {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>)
    -> Subscription;
}

pub struct Observable<T> {
  core: Arc<dyn CoreObservable<T>>,
}

impl<T> Clone for Observable<T> {
  fn clone(&self) -> Self { Observable { core: self.core.clone() } }
}

impl<T: Send + 'static> Observable<T> {
  pub fn new(core: impl CoreObservable<T> + 'static) -> Self { Observable { core: Arc::new(core) } }

  /// Subscribes `observer` with no scheduler.
  pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
    self.subscribe_with(observer, None)
  }

  /// Subscribes `observer`. Operators and factories that need to schedule
  /// work use `scheduler` unless they were given one explicitly.
  ///
  /// The observer is gated by the stream grammar; after a terminal
  /// notification it receives nothing more and the whole upstream chain is
  /// released. Unsubscribing the returned handle seals the observer
  /// immediately, even if a notification is already in flight on another
  /// thread.
  pub fn subscribe_with(
    &self, observer: impl Observer<T> + 'static, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let subscriber = Subscriber::new(observer);
    let upstream = SingleSubscription::new();
    let auto = AutoDetachObserver { subscriber: subscriber.clone(), upstream: upstream.clone() };
    upstream.set(self.core.actual_subscribe(Box::new(auto), scheduler));
    Subscription::new(move || {
      subscriber.unsubscribe();
      upstream.unsubscribe();
    })
  }

  /// Subscribes a `next` closure; an error notification is logged.
  pub fn subscribe_next(&self, next: impl FnMut(T) + Send + 'static) -> Subscription {
    self.subscribe(FnMutObserver(next))
  }

  pub fn subscribe_all(
    &self, next: impl FnMut(T) + Send + 'static, error: impl FnMut(RxError) + Send + 'static,
    complete: impl FnMut() + Send + 'static,
  ) -> Subscription {
    self.subscribe(ObserverFns { next, error, complete })
  }

  /// Subscription used by operators for their inputs. Gates the grammar
  /// but leaves the release of the input to the operator's own handle.
  pub(crate) fn subscribe_gated(
    &self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let subscriber = Subscriber::from_boxed(observer);
    let inner = self.core.actual_subscribe(Box::new(subscriber.clone()), scheduler);
    Subscription::new(move || {
      subscriber.unsubscribe();
      inner.unsubscribe();
    })
  }

  /// Calls the core directly, without any gating. Meant for implementing
  /// custom operators.
  pub fn actual_subscribe(
    &self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    self.core.actual_subscribe(observer, scheduler)
  }
}

impl<T: Send + 'static> CoreObservable<T> for Observable<T> {
  fn actual_subscribe(
    &self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    self.core.actual_subscribe(observer, scheduler)
  }
}
