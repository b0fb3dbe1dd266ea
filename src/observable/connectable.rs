use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use parking_lot::Mutex;

use crate::{
  observable::{CoreObservable, Observable},
  observer::BoxedObserver,
  scheduler::SchedulerRef,
  subscription::{SingleSubscription, Subscription, SubscriptionLike},
};

/// Something that can be pushed into and subscribed to; implemented by
/// every subject.
pub trait SubjectLike<T>: Send + Sync + 'static {
  fn as_observer(&self) -> BoxedObserver<T>;

  fn as_observable(&self) -> Observable<T>;
}

/// A source that shares one subscription among all its subscribers, but
/// only starts it on [`connect`](ConnectableObservable::connect).
pub struct ConnectableObservable<T> {
  inner: Arc<Connectable<T>>,
}

struct Connectable<T> {
  source: Observable<T>,
  subject: Box<dyn SubjectLike<T>>,
  connection: Mutex<Option<SingleSubscription>>,
}

impl<T> Clone for ConnectableObservable<T> {
  fn clone(&self) -> Self { ConnectableObservable { inner: self.inner.clone() } }
}

impl<T: Send + 'static> ConnectableObservable<T> {
  /// Multicasts `source` through `subject`.
  pub fn new(source: Observable<T>, subject: impl SubjectLike<T>) -> Self {
    ConnectableObservable {
      inner: Arc::new(Connectable { source, subject: Box::new(subject), connection: Mutex::new(None) }),
    }
  }

  /// Subscribes the subject to the source. While connected, further calls
  /// return the existing connection. Unsubscribing the returned handle
  /// disconnects.
  pub fn connect(&self) -> Subscription { self.connect_with(None) }

  /// [`connect`](Self::connect), passing `scheduler` to the source.
  pub fn connect_with(&self, scheduler: Option<SchedulerRef>) -> Subscription {
    let (connection, fresh) = {
      let mut slot = self.inner.connection.lock();
      match slot.as_ref() {
        Some(current) if !current.is_closed() => (current.clone(), false),
        _ => {
          let connection = SingleSubscription::new();
          *slot = Some(connection.clone());
          (connection, true)
        }
      }
    };
    if fresh {
      tracing::debug!("connectable observable connecting");
      connection.set(self.inner.source.subscribe_gated(self.inner.subject.as_observer(), scheduler));
    }
    let inner = Arc::downgrade(&self.inner);
    let handle = connection.clone();
    Subscription::new(move || {
      handle.unsubscribe();
      if let Some(inner) = inner.upgrade() {
        let mut slot = inner.connection.lock();
        if matches!(slot.as_ref(), Some(current) if current.is_closed()) {
          *slot = None;
          tracing::debug!("connectable observable disconnected");
        }
      }
    })
  }

  pub fn is_connected(&self) -> bool {
    matches!(self.inner.connection.lock().as_ref(), Some(current) if !current.is_closed())
  }

  /// The shared side, as a plain observable. Subscribing does not connect.
  pub fn as_observable(&self) -> Observable<T> { Observable::new(self.clone()) }

  /// An observable that connects when its first subscriber arrives and
  /// disconnects when the last one leaves.
  pub fn ref_count(&self) -> Observable<T> {
    Observable::new(RefCountOp { connectable: self.clone(), state: Arc::new(Mutex::new(RefCountState::default())) })
  }
}

impl<T: Send + 'static> CoreObservable<T> for ConnectableObservable<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    self.inner.subject.as_observable().actual_subscribe(observer, scheduler)
  }
}

struct RefCountOp<T> {
  connectable: ConnectableObservable<T>,
  state: Arc<Mutex<RefCountState>>,
}

#[derive(Default)]
struct RefCountState {
  count: usize,
  connection: Option<Subscription>,
}

impl<T: Send + 'static> CoreObservable<T> for RefCountOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let subscription = self.connectable.actual_subscribe(observer, scheduler.clone());
    let first = {
      let mut state = self.state.lock();
      state.count += 1;
      state.count == 1
    };
    if first {
      let connection = self.connectable.connect_with(scheduler);
      let mut state = self.state.lock();
      if state.count == 0 {
        drop(state);
        connection.unsubscribe();
      } else {
        state.connection = Some(connection);
      }
    }
    let state = self.state.clone();
    let released = AtomicBool::new(false);
    Subscription::new(move || {
      if released.swap(true, Ordering::AcqRel) {
        return;
      }
      subscription.unsubscribe();
      let connection = {
        let mut state = state.lock();
        state.count -= 1;
        if state.count == 0 { state.connection.take() } else { None }
      };
      if let Some(connection) = connection {
        connection.unsubscribe();
      }
    })
  }
}
