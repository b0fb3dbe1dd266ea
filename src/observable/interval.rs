use std::time::Duration;

use crate::{
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::{schedule_periodic, timeout_or, SchedulerRef},
  subscription::Subscription,
};

struct TimerOp {
  due: Duration,
  period: Option<Duration>,
}

/// Emits `0, 1, 2, ...` every `period`, starting one period after
/// subscription. Never completes.
pub fn interval(period: Duration) -> Observable<u64> { timer(period, Some(period)) }

/// Emits `0` after `due`. With a `period` it keeps counting at that rate,
/// otherwise it completes right after the single value.
pub fn timer(due: Duration, period: Option<Duration>) -> Observable<u64> {
  Observable::new(TimerOp { due, period })
}

impl CoreObservable<u64> for TimerOp {
  fn actual_subscribe(
    &self, mut observer: BoxedObserver<u64>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let scheduler = timeout_or(&scheduler);
    match self.period {
      None => scheduler.schedule_relative(
        self.due,
        Box::new(move || {
          observer.next(0);
          observer.complete();
        }),
      ),
      Some(period) => {
        let mut count = 0;
        schedule_periodic(&scheduler, self.due, period, move || {
          observer.next(count);
          count += 1;
        })
      }
    }
  }
}
