use std::{sync::Arc, time::Duration};

use crate::{
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::{schedule_recursive, trampoline_or, SchedulerRef},
  subscription::Subscription,
};

struct GenerateOp<S, T> {
  initial: S,
  condition: Arc<dyn Fn(&S) -> bool + Send + Sync>,
  iterate: Arc<dyn Fn(&S) -> S + Send + Sync>,
  result: Arc<dyn Fn(&S) -> T + Send + Sync>,
}

/// A loop as an observable: starting from `initial`, emits `result(state)`
/// while `condition(state)` holds, moving on with `iterate`. One iteration
/// per scheduled task.
pub fn generate<S, T>(
  initial: S, condition: impl Fn(&S) -> bool + Send + Sync + 'static,
  iterate: impl Fn(&S) -> S + Send + Sync + 'static, result: impl Fn(&S) -> T + Send + Sync + 'static,
) -> Observable<T>
where
  S: Clone + Send + Sync + 'static,
  T: Send + 'static,
{
  Observable::new(GenerateOp {
    initial,
    condition: Arc::new(condition),
    iterate: Arc::new(iterate),
    result: Arc::new(result),
  })
}

impl<S, T> CoreObservable<T> for GenerateOp<S, T>
where
  S: Clone + Send + Sync + 'static,
  T: Send + 'static,
{
  fn actual_subscribe(&self, mut observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let mut state = self.initial.clone();
    let mut first = true;
    let (condition, iterate, result) = (self.condition.clone(), self.iterate.clone(), self.result.clone());
    schedule_recursive(&trampoline_or(&scheduler), Duration::ZERO, move || {
      if observer.is_closed() {
        return None;
      }
      if !first {
        state = iterate(&state);
      }
      first = false;
      if condition(&state) {
        observer.next(result(&state));
        Some(Duration::ZERO)
      } else {
        observer.complete();
        None
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{ReactiveTest, TestScheduler};

  #[rxkit_macro::test]
  fn squares_below_ten() {
    let scheduler = TestScheduler::new();
    let res = scheduler.start(|| generate(1, |x| *x < 4, |x| x + 1, |x| x * x));
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(200, 1),
        ReactiveTest::on_next(200, 4),
        ReactiveTest::on_next(200, 9),
        ReactiveTest::on_completed(200),
      ]
    );
  }

  #[rxkit_macro::test]
  fn condition_false_from_start() {
    let scheduler = TestScheduler::new();
    let res = scheduler.start(|| generate(0, |_| false, |x| x + 1, |x| *x));
    assert_eq!(res.messages(), vec![ReactiveTest::on_completed(200)]);
  }
}
