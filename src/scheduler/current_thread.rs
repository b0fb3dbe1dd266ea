use std::{
  cmp::Ordering as CmpOrdering,
  collections::BinaryHeap,
  sync::Arc,
  time::{Duration, Instant},
};

use parking_lot::Mutex;

use super::{Action, Scheduler};
use crate::subscription::{BooleanSubscription, Subscription, SubscriptionLike};

/// Trampoline scheduler.
///
/// The first call on an idle instance drains the queue on the calling
/// thread; calls made while draining (from inside an action) are queued and
/// run after the current action returns. This turns synchronous recursion
/// into iteration.
#[derive(Clone)]
pub struct CurrentThreadScheduler {
  inner: Arc<Inner>,
}

struct Inner {
  epoch: Instant,
  state: Mutex<State>,
}

#[derive(Default)]
struct State {
  running: bool,
  next_id: u64,
  queue: BinaryHeap<Queued>,
}

struct Queued {
  due: Duration,
  id: u64,
  action: Action,
  cancel: BooleanSubscription,
}

impl PartialEq for Queued {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.id == other.id }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
  fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> { Some(self.cmp(other)) }
}

impl Ord for Queued {
  fn cmp(&self, other: &Self) -> CmpOrdering {
    // Min-heap: earlier times first, then FIFO by id
    other.due.cmp(&self.due).then_with(|| other.id.cmp(&self.id))
  }
}

impl CurrentThreadScheduler {
  pub fn new() -> Self {
    CurrentThreadScheduler {
      inner: Arc::new(Inner { epoch: Instant::now(), state: Mutex::new(State::default()) }),
    }
  }

  /// Whether a drain loop is currently running on this instance.
  pub fn is_running(&self) -> bool { self.inner.state.lock().running }

  fn drain(&self) {
    loop {
      let next = {
        let mut state = self.inner.state.lock();
        match state.queue.pop() {
          Some(item) => item,
          None => {
            state.running = false;
            return;
          }
        }
      };
      if next.cancel.is_closed() {
        continue;
      }
      let now = self.now();
      if next.due > now {
        std::thread::sleep(next.due - now);
      }
      if !next.cancel.is_closed() {
        (next.action)();
      }
    }
  }
}

impl Default for CurrentThreadScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for CurrentThreadScheduler {
  fn now(&self) -> Duration { self.inner.epoch.elapsed() }

  fn schedule_relative(&self, delay: Duration, action: Action) -> Subscription {
    let cancel = BooleanSubscription::new();
    let due = self.now() + delay;
    let start = {
      let mut state = self.inner.state.lock();
      let id = state.next_id;
      state.next_id += 1;
      state.queue.push(Queued { due, id, action, cancel: cancel.clone() });
      !std::mem::replace(&mut state.running, true)
    };
    if start {
      self.drain();
    }
    cancel.into()
  }
}
