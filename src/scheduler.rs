//! Time sources and task queues.
//!
//! Every scheduler measures time as a [`Duration`] since its own epoch and
//! returns a [`Subscription`] for each scheduled action; unsubscribing it
//! cancels the action if it has not started yet.
//!
//! | Scheduler | Where actions run |
//! |-----------|-------------------|
//! | [`ImmediateScheduler`] | inline, on the calling thread |
//! | [`CurrentThreadScheduler`] | trampoline on the thread that scheduled first |
//! | [`NewThreadScheduler`] | a fresh OS thread per action |
//! | `ThreadPoolScheduler` | a `futures` thread pool (feature `futures-scheduler`) |
//! | `TokioScheduler` | a tokio runtime (feature `tokio-scheduler`) |
//! | [`VirtualTimeScheduler`] | whoever drives the virtual clock |
use std::{
  sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
  },
  time::Duration,
};

use parking_lot::Mutex;

use crate::subscription::Subscription;

mod current_thread;
mod immediate;
mod new_thread;
#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
mod thread_pool;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;
mod virtual_time;

pub use current_thread::CurrentThreadScheduler;
pub use immediate::ImmediateScheduler;
pub use new_thread::NewThreadScheduler;
#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
pub use thread_pool::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;
pub use virtual_time::VirtualTimeScheduler;

pub type Action = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
  /// Current time in this scheduler's frame.
  fn now(&self) -> Duration;

  /// Runs `action` as soon as possible.
  fn schedule(&self, action: Action) -> Subscription {
    self.schedule_relative(Duration::ZERO, action)
  }

  /// Runs `action` once at least `delay` has elapsed.
  fn schedule_relative(&self, delay: Duration, action: Action) -> Subscription;

  /// Runs `action` at or after the instant `due`.
  fn schedule_absolute(&self, due: Duration, action: Action) -> Subscription {
    self.schedule_relative(due.saturating_sub(self.now()), action)
  }
}

pub type SchedulerRef = Arc<dyn Scheduler>;

/// The supplied scheduler, or a fresh trampoline when none was supplied.
pub(crate) fn trampoline_or(scheduler: &Option<SchedulerRef>) -> SchedulerRef {
  match scheduler {
    Some(s) => s.clone(),
    None => Arc::new(CurrentThreadScheduler::new()),
  }
}

/// The supplied scheduler, or a new-thread scheduler for time-shifted work.
pub(crate) fn timeout_or(scheduler: &Option<SchedulerRef>) -> SchedulerRef {
  match scheduler {
    Some(s) => s.clone(),
    None => Arc::new(NewThreadScheduler::new()),
  }
}

#[derive(Clone, Copy, Debug)]
enum Due {
  Relative(Duration),
  Absolute(Duration),
}

struct Recursive<F> {
  scheduler: SchedulerRef,
  action: Mutex<F>,
  closed: AtomicBool,
  generation: AtomicU64,
  pending: Mutex<(u64, Option<Subscription>)>,
}

fn recurse<F>(this: &Arc<Recursive<F>>, due: Due)
where
  F: FnMut() -> Option<Due> + Send + 'static,
{
  let generation = this.generation.fetch_add(1, Ordering::AcqRel) + 1;
  let me = this.clone();
  let task: Action = Box::new(move || {
    if me.closed.load(Ordering::Acquire) {
      return;
    }
    let next = {
      let mut action = me.action.lock();
      (*action)()
    };
    if let Some(due) = next {
      recurse(&me, due);
    }
  });
  let handle = match due {
    Due::Relative(delay) => this.scheduler.schedule_relative(delay, task),
    Due::Absolute(at) => this.scheduler.schedule_absolute(at, task),
  };
  {
    let mut pending = this.pending.lock();
    if pending.0 < generation {
      *pending = (generation, Some(handle.clone()));
    }
  }
  if this.closed.load(Ordering::Acquire) {
    handle.unsubscribe();
  }
}

fn start_recursive<F>(scheduler: &SchedulerRef, first: Due, action: F) -> Subscription
where
  F: FnMut() -> Option<Due> + Send + 'static,
{
  let state = Arc::new(Recursive {
    scheduler: scheduler.clone(),
    action: Mutex::new(action),
    closed: AtomicBool::new(false),
    generation: AtomicU64::new(0),
    pending: Mutex::new((0, None)),
  });
  recurse(&state, first);
  Subscription::new(move || {
    state.closed.store(true, Ordering::Release);
    let pending = state.pending.lock().1.take();
    if let Some(pending) = pending {
      pending.unsubscribe();
    }
  })
}

/// Runs `action` after `delay`, then again after every delay it returns,
/// until it returns `None` or the returned subscription is released.
pub fn schedule_recursive<F>(scheduler: &SchedulerRef, delay: Duration, mut action: F) -> Subscription
where
  F: FnMut() -> Option<Duration> + Send + 'static,
{
  start_recursive(scheduler, Due::Relative(delay), move || action().map(Due::Relative))
}

/// Runs `action` at `now + due` and then every `period`. Due times are
/// computed from the first one, so a slow action does not shift later runs.
pub fn schedule_periodic<F>(
  scheduler: &SchedulerRef, due: Duration, period: Duration, mut action: F,
) -> Subscription
where
  F: FnMut() + Send + 'static,
{
  let mut next_due = scheduler.now() + due;
  start_recursive(scheduler, Due::Absolute(next_due), move || {
    action();
    next_due += period;
    Some(Due::Absolute(next_due))
  })
}
