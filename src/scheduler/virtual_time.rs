//! Deterministic scheduler driven by an explicit virtual clock.
//!
//! The clock is an integer tick counter; one tick maps to one millisecond
//! when the scheduler is used through the [`Scheduler`] trait. Nothing runs
//! until the clock is driven with [`VirtualTimeScheduler::advance_to`],
//! [`VirtualTimeScheduler::advance_by`] or [`VirtualTimeScheduler::start`].
use std::{cmp::Ordering, collections::BinaryHeap, fmt, sync::Arc, time::Duration};

use parking_lot::Mutex;

use super::{Action, Scheduler};
use crate::{
  error::RxError,
  subscription::{BooleanSubscription, Subscription, SubscriptionLike},
};

#[derive(Clone)]
pub struct VirtualTimeScheduler {
  inner: Arc<Inner>,
}

struct Inner {
  state: Mutex<State>,
}

struct State {
  clock: u64,
  next_id: u64,
  enabled: bool,
  stop_time: Option<u64>,
  queue: BinaryHeap<ScheduledItem>,
}

struct ScheduledItem {
  due: u64,
  id: u64,
  action: Action,
  cancel: BooleanSubscription,
}

impl PartialEq for ScheduledItem {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.id == other.id }
}

impl Eq for ScheduledItem {}

impl PartialOrd for ScheduledItem {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledItem {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by id
    other.due.cmp(&self.due).then_with(|| other.id.cmp(&self.id))
  }
}

#[inline]
pub(crate) fn to_ticks(d: Duration) -> u64 { u64::try_from(d.as_millis()).unwrap_or(u64::MAX) }

impl VirtualTimeScheduler {
  pub fn new() -> Self { Self::with_clock(0) }

  pub fn with_clock(initial: u64) -> Self {
    VirtualTimeScheduler {
      inner: Arc::new(Inner {
        state: Mutex::new(State {
          clock: initial,
          next_id: 0,
          enabled: false,
          stop_time: None,
          queue: BinaryHeap::new(),
        }),
      }),
    }
  }

  /// Current virtual time in ticks.
  pub fn clock(&self) -> u64 { self.inner.state.lock().clock }

  pub fn is_enabled(&self) -> bool { self.inner.state.lock().enabled }

  /// Number of queued actions, cancelled ones included.
  pub fn pending_count(&self) -> usize { self.inner.state.lock().queue.len() }

  /// Limits [`start`](Self::start) to actions due at or before `stop_time`.
  pub fn set_stop_time(&self, stop_time: Option<u64>) { self.inner.state.lock().stop_time = stop_time; }

  /// Schedules `action` at the absolute tick `due`. A due time at or before
  /// the clock runs after the actions already queued for the current tick.
  pub fn schedule_at(&self, due: u64, action: impl FnOnce() + Send + 'static) -> Subscription {
    self.enqueue(due, Box::new(action))
  }

  /// Schedules `action` `delay` ticks from now.
  pub fn schedule_after(&self, delay: u64, action: impl FnOnce() + Send + 'static) -> Subscription {
    let due = self.clock().saturating_add(delay);
    self.enqueue(due, Box::new(action))
  }

  fn enqueue(&self, due: u64, action: Action) -> Subscription {
    let cancel = BooleanSubscription::new();
    let mut state = self.inner.state.lock();
    let id = state.next_id;
    state.next_id += 1;
    state.queue.push(ScheduledItem { due, id, action, cancel: cancel.clone() });
    cancel.into()
  }

  /// Pops the next live action due at or before `limit` and moves the clock
  /// forward to its due time.
  fn pop_due(&self, limit: Option<u64>) -> Option<Action> {
    let mut state = self.inner.state.lock();
    if !state.enabled {
      return None;
    }
    loop {
      let due = state.queue.peek()?.due;
      if limit.is_some_and(|limit| due > limit) {
        return None;
      }
      let item = state.queue.pop()?;
      if item.cancel.is_closed() {
        continue;
      }
      if item.due > state.clock {
        state.clock = item.due;
      }
      return Some(item.action);
    }
  }

  fn enable(&self) -> Result<(), RxError> {
    let mut state = self.inner.state.lock();
    if state.enabled {
      return Err(RxError::msg("virtual time scheduler is already running"));
    }
    state.enabled = true;
    Ok(())
  }

  /// Runs queued actions in due order until the queue is empty, the stop
  /// time is reached, or [`stop`](Self::stop) is called.
  pub fn start(&self) {
    if let Err(err) = self.enable() {
      tracing::warn!(error = %err, "start ignored");
      return;
    }
    let stop_time = self.inner.state.lock().stop_time;
    while let Some(action) = self.pop_due(stop_time) {
      action();
    }
    self.inner.state.lock().enabled = false;
    tracing::debug!(clock = self.clock(), "virtual time run finished");
  }

  /// Makes a running [`start`](Self::start) or advance return after the
  /// current action.
  pub fn stop(&self) { self.inner.state.lock().enabled = false; }

  /// Runs every action due at or before `time`, then sets the clock to
  /// `time`.
  pub fn advance_to(&self, time: u64) -> Result<(), RxError> {
    if time < self.clock() {
      return Err(RxError::ArgumentOutOfRange);
    }
    self.enable()?;
    while let Some(action) = self.pop_due(Some(time)) {
      action();
    }
    let mut state = self.inner.state.lock();
    state.enabled = false;
    if state.clock < time {
      state.clock = time;
    }
    tracing::trace!(clock = state.clock, pending = state.queue.len(), "advanced virtual time");
    Ok(())
  }

  pub fn advance_by(&self, delta: u64) -> Result<(), RxError> {
    let target = self.clock().saturating_add(delta);
    self.advance_to(target)
  }

  /// Moves the clock forward without running anything.
  pub fn sleep(&self, delta: u64) {
    let mut state = self.inner.state.lock();
    state.clock = state.clock.saturating_add(delta);
  }
}

impl Default for VirtualTimeScheduler {
  fn default() -> Self { Self::new() }
}

impl fmt::Debug for VirtualTimeScheduler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.inner.state.lock();
    f.debug_struct("VirtualTimeScheduler")
      .field("clock", &state.clock)
      .field("pending", &state.queue.len())
      .field("enabled", &state.enabled)
      .finish()
  }
}

impl Scheduler for VirtualTimeScheduler {
  fn now(&self) -> Duration { Duration::from_millis(self.clock()) }

  fn schedule_relative(&self, delay: Duration, action: Action) -> Subscription {
    let due = self.clock().saturating_add(to_ticks(delay));
    self.enqueue(due, action)
  }

  fn schedule_absolute(&self, due: Duration, action: Action) -> Subscription {
    self.enqueue(to_ticks(due), action)
  }
}
