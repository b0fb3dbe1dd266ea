use std::time::Duration;

use crate::{
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::{schedule_recursive, trampoline_or, SchedulerRef},
  subscription::Subscription,
};

struct FromIterOp<I>(I);

struct SequenceOp<T>(Vec<T>);

/// Emits every item of `iter` in order, then completes.
///
/// Each item is emitted from its own scheduled task; without a scheduler
/// the whole iteration runs on a trampoline inside `subscribe`. The
/// iterable is cloned for every subscription.
pub fn from_iter<I>(iter: I) -> Observable<I::Item>
where
  I: IntoIterator + Clone + Send + Sync + 'static,
  I::IntoIter: Send + 'static,
  I::Item: Send + 'static,
{
  Observable::new(FromIterOp(iter))
}

/// `count` consecutive integers starting at `start`.
pub fn range(start: i64, count: usize) -> Observable<i64> {
  let end = start.saturating_add(i64::try_from(count).unwrap_or(i64::MAX));
  from_iter(start..end)
}

/// Emits `value` `count` times, or forever when `count` is `None`.
pub fn repeat_value<T: Clone + Send + Sync + 'static>(value: T, count: Option<usize>) -> Observable<T> {
  from_iter(std::iter::repeat(value).take(count.unwrap_or(usize::MAX)))
}

/// Emits all `values` synchronously inside `subscribe`, then completes.
pub fn sequence<T: Clone + Send + Sync + 'static>(values: Vec<T>) -> Observable<T> {
  Observable::new(SequenceOp(values))
}

impl<I> CoreObservable<I::Item> for FromIterOp<I>
where
  I: IntoIterator + Clone + Send + Sync + 'static,
  I::IntoIter: Send + 'static,
  I::Item: Send + 'static,
{
  fn actual_subscribe(
    &self, mut observer: BoxedObserver<I::Item>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let mut iter = self.0.clone().into_iter();
    schedule_recursive(&trampoline_or(&scheduler), Duration::ZERO, move || {
      if observer.is_closed() {
        return None;
      }
      match iter.next() {
        Some(v) => {
          observer.next(v);
          Some(Duration::ZERO)
        }
        None => {
          observer.complete();
          None
        }
      }
    })
  }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for SequenceOp<T> {
  fn actual_subscribe(&self, mut observer: BoxedObserver<T>, _: Option<SchedulerRef>) -> Subscription {
    for v in self.0.iter() {
      if observer.is_closed() {
        break;
      }
      observer.next(v.clone());
    }
    observer.complete();
    Subscription::empty()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use super::*;
  use crate::testing::{ReactiveTest, TestScheduler};

  #[rxkit_macro::test]
  fn emits_on_the_scheduler() {
    let scheduler = TestScheduler::new();
    let res = scheduler.start(|| from_iter(vec![1, 2, 3]));
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(200, 1),
        ReactiveTest::on_next(200, 2),
        ReactiveTest::on_next(200, 3),
        ReactiveTest::on_completed(200),
      ]
    );
  }

  #[rxkit_macro::test]
  fn range_without_scheduler() {
    let seen = Arc::new(Mutex::new(vec![]));
    let s = seen.clone();
    range(5, 4).subscribe_next(move |v| s.lock().push(v));
    assert_eq!(*seen.lock(), vec![5, 6, 7, 8]);
  }

  #[rxkit_macro::test]
  fn repeat_value_count() {
    let seen = Arc::new(Mutex::new(vec![]));
    let s = seen.clone();
    repeat_value('x', Some(3)).subscribe_next(move |v| s.lock().push(v));
    assert_eq!(*seen.lock(), vec!['x'; 3]);
  }

  #[rxkit_macro::test]
  fn sequence_is_synchronous() {
    let scheduler = TestScheduler::new();
    let res = scheduler.start(|| sequence(vec!['a', 'b']));
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(200, 'a'),
        ReactiveTest::on_next(200, 'b'),
        ReactiveTest::on_completed(200),
      ]
    );
  }
}
