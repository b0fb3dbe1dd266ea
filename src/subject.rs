//! Subjects: observers that multicast whatever is pushed into them.
//!
//! | Subject | Late subscriber receives |
//! |---------|--------------------------|
//! | [`Subject`] | only what is pushed after it subscribed |
//! | [`BehaviorSubject`] | the current value, then live values |
//! | [`ReplaySubject`] | the buffered window, then live values |
//! | [`AsyncSubject`] | the final value, once the subject completes |
//!
//! Pushes are serialized by a push lock, so every subscriber sees the same
//! global order. A push made from inside a subscriber callback is queued and
//! broadcast once the current push has reached every subscriber. The
//! subscriber list is snapshotted for each push and no internal mutex is
//! held while observers run.
//!
//! After `dispose()` every `try_*` method returns [`RxError::Disposed`].
//! Pushing through the [`Observer`] trait logs a warning instead, and
//! subscribing through an [`Observable`](crate::observable::Observable)
//! delivers `Error(Disposed)`.
use std::{cell::RefCell, collections::VecDeque, sync::Arc};

use parking_lot::{Mutex, ReentrantMutex};

use crate::{
  error::RxError,
  notification::Notification,
  observer::{BoxedObserver, Observer, Subscriber},
  subscription::Subscription,
};

mod async_subject;
mod behavior;
mod publish;
mod replay;
mod subscribers;

pub use async_subject::AsyncSubject;
pub use behavior::BehaviorSubject;
pub use publish::Subject;
pub use replay::ReplaySubject;
use subscribers::Subscribers;

/// How a subject terminated.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Terminal {
  Error(RxError),
  Complete,
}

impl Terminal {
  pub(crate) fn from_notification<T>(notification: Notification<T>) -> Result<Terminal, T> {
    match notification {
      Notification::Next(value) => Err(value),
      Notification::Error(err) => Ok(Terminal::Error(err)),
      Notification::Complete => Ok(Terminal::Complete),
    }
  }

  pub(crate) fn deliver<T, O: Observer<T> + ?Sized>(self, observer: &mut O) {
    match self {
      Terminal::Error(err) => observer.error(err),
      Terminal::Complete => observer.complete(),
    }
  }
}

/// Subscriber bookkeeping shared by every subject kind.
pub(crate) struct SubjectCore<T> {
  // `true` while a push is being broadcast
  push: ReentrantMutex<RefCell<bool>>,
  pending: Mutex<VecDeque<Notification<T>>>,
  state: Arc<Mutex<CoreState<T>>>,
}

struct CoreState<T> {
  subscribers: Subscribers<T>,
  terminal: Option<Terminal>,
  disposed: bool,
}

impl<T> Default for SubjectCore<T> {
  fn default() -> Self {
    SubjectCore {
      push: ReentrantMutex::new(RefCell::new(false)),
      pending: Mutex::new(VecDeque::new()),
      state: Arc::new(Mutex::new(CoreState {
        subscribers: Subscribers::default(),
        terminal: None,
        disposed: false,
      })),
    }
  }
}

impl<T: Send + 'static> SubjectCore<T> {
  /// Runs `emit` for `item` and then for every push queued meanwhile from
  /// inside a callback. Pushes from other threads wait for the lock.
  pub(crate) fn serialize(
    &self, item: Notification<T>, mut emit: impl FnMut(Notification<T>),
  ) -> Result<(), RxError> {
    if self.is_disposed() {
      return Err(RxError::Disposed);
    }
    let busy = self.push.lock();
    if busy.replace(true) {
      self.pending.lock().push_back(item);
      return Ok(());
    }
    let mut current = Some(item);
    while let Some(item) = current {
      emit(item);
      current = self.pending.lock().pop_front();
    }
    busy.replace(false);
    Ok(())
  }

  pub(crate) fn is_disposed(&self) -> bool { self.state.lock().disposed }

  pub(crate) fn is_stopped(&self) -> bool { self.state.lock().terminal.is_some() }

  pub(crate) fn observer_count(&self) -> usize { self.state.lock().subscribers.len() }

  /// The subscribers present right now, or `None` once terminated.
  pub(crate) fn targets(&self) -> Result<Option<Vec<Subscriber<T>>>, RxError> {
    let state = self.state.lock();
    if state.disposed {
      Err(RxError::Disposed)
    } else if state.terminal.is_some() {
      Ok(None)
    } else {
      Ok(Some(state.subscribers.snapshot()))
    }
  }

  /// Sends `value` to every target; the last one gets it without a clone.
  pub(crate) fn broadcast(targets: Vec<Subscriber<T>>, value: T)
  where
    T: Clone,
  {
    let mut iter = targets.into_iter().peekable();
    while let Some(mut observer) = iter.next() {
      if iter.peek().is_some() {
        observer.next(value.clone());
      } else {
        observer.next(value);
        break;
      }
    }
  }

  /// Records the terminal notification and takes the subscribers that must
  /// receive it. `Ok(None)` if the subject had already terminated.
  pub(crate) fn terminate(&self, terminal: &Terminal) -> Result<Option<Vec<Subscriber<T>>>, RxError> {
    let mut state = self.state.lock();
    if state.disposed {
      return Err(RxError::Disposed);
    }
    if state.terminal.is_some() {
      return Ok(None);
    }
    state.terminal = Some(terminal.clone());
    Ok(Some(state.subscribers.drain()))
  }

  /// Broadcasts one notification the way a plain subject does.
  pub(crate) fn publish(&self, item: Notification<T>)
  where
    T: Clone,
  {
    match Terminal::from_notification(item) {
      Err(value) => {
        if let Ok(Some(targets)) = self.targets() {
          Self::broadcast(targets, value);
        }
      }
      Ok(terminal) => {
        if let Ok(Some(targets)) = self.terminate(&terminal) {
          Self::deliver_terminal(targets, &terminal);
        }
      }
    }
  }

  pub(crate) fn deliver_terminal(targets: Vec<Subscriber<T>>, terminal: &Terminal) {
    for mut observer in targets {
      terminal.clone().deliver(&mut observer);
    }
  }

  /// Adds `observer`. `prelude` runs first with the terminal notification,
  /// if any, and pushes whatever the subject kind replays. On a disposed
  /// subject the observer is handed back untouched.
  pub(crate) fn subscribe(
    &self, observer: BoxedObserver<T>, prelude: impl FnOnce(&mut Subscriber<T>, Option<&Terminal>),
  ) -> Result<Subscription, BoxedObserver<T>> {
    let _push = self.push.lock();
    let terminal = {
      let state = self.state.lock();
      if state.disposed {
        return Err(observer);
      }
      state.terminal.clone()
    };
    let mut subscriber = Subscriber::from_boxed(observer);
    prelude(&mut subscriber, terminal.as_ref());
    if let Some(terminal) = terminal {
      terminal.deliver(&mut subscriber);
      return Ok(Subscription::empty());
    }
    let id = self.state.lock().subscribers.add(subscriber.clone());
    let state = Arc::downgrade(&self.state);
    Ok(Subscription::new(move || {
      if let Some(state) = state.upgrade() {
        state.lock().subscribers.remove(id);
      }
      subscriber.unsubscribe();
    }))
  }

  /// Subscribe path of the observable interface: a disposed subject answers
  /// with `Error(Disposed)`.
  pub(crate) fn subscribe_or_error(
    &self, observer: BoxedObserver<T>, prelude: impl FnOnce(&mut Subscriber<T>, Option<&Terminal>),
  ) -> Subscription {
    self.subscribe(observer, prelude).unwrap_or_else(|mut observer| {
      observer.error(RxError::Disposed);
      Subscription::empty()
    })
  }

  pub(crate) fn dispose(&self) {
    let dropped = {
      let mut state = self.state.lock();
      state.disposed = true;
      std::mem::take(&mut state.subscribers)
    };
    drop(dropped);
  }
}

/// Reports a push into a disposed subject made through the `Observer` trait.
pub(crate) fn warn_disposed(result: Result<(), RxError>) {
  if let Err(err) = result {
    tracing::warn!(error = %err, "push into a disposed subject ignored");
  }
}
