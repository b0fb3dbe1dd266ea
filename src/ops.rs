//! Operators.
//!
//! Every operator is an inherent method of [`Observable`] that returns a new
//! observable. Operators taking a user function come in two versions: the
//! plain one, and a `try_` one whose function returns
//! `Result<_, RxError>`. An `Err` is delivered as the error of the output and
//! the source subscription is released.
//!
//! Each file holds one operator family as an `XxxOp` core that subscribes to
//! the source with an `XxxObserver` wrapping the downstream observer.
use crate::{
  observable::{CoreObservable, Observable},
  observer::BoxedObserver,
  scheduler::SchedulerRef,
  subscription::{RefCountSubscription, Subscription},
};

mod amb;
mod buffer;
mod combine_latest;
mod debounce;
mod delay;
mod distinct;
mod distinct_until_changed;
mod filter;
mod first;
mod group_by;
mod group_by_until;
mod group_join;
mod map;
mod materialize;
mod merge;
mod multicast;
mod observe_on;
mod pairwise;
mod reduce;
mod retry;
mod scan;
mod skip;
mod start_with;
mod subscribe_on;
mod switch_latest;
mod take;
mod tap;
mod throttle;
mod timeout;
mod to_list;
mod utility;
mod window;
mod with_latest_from;
mod zip;

pub use amb::amb;
pub use combine_latest::combine_latest;
pub use group_by::GroupedObservable;
pub use merge::merge;
pub use zip::zip;

/// One of two input types, used to run binary operators through their
/// n-ary implementation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Either<A, B> {
  Left(A),
  Right(B),
}

/// Splits a two-element vector produced from `[a.map(Left), b.map(Right)]`
/// back into a pair.
pub(crate) fn into_pair<A, B>(values: Vec<Either<A, B>>) -> Option<(A, B)> {
  let mut values = values.into_iter();
  match (values.next(), values.next()) {
    (Some(Either::Left(a)), Some(Either::Right(b))) => Some((a, b)),
    _ => None,
  }
}

struct AddRefOp<T> {
  source: Observable<T>,
  ref_count: RefCountSubscription,
}

/// `source`, holding a reference on `ref_count` for as long as a subscriber
/// is attached. Used for the inner observables of window and group
/// operators, which keep the outer source connected while they are in use.
pub(crate) fn add_ref<T: Send + 'static>(source: Observable<T>, ref_count: &RefCountSubscription) -> Observable<T> {
  Observable::new(AddRefOp { source, ref_count: ref_count.clone() })
}

impl<T: Send + 'static> CoreObservable<T> for AddRefOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let reference = self.ref_count.get_reference();
    let inner = self.source.actual_subscribe(observer, scheduler);
    Subscription::new(move || {
      inner.unsubscribe();
      reference.unsubscribe();
    })
  }
}
