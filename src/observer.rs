//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).
//!
//! Two wrappers enforce the stream grammar `next* (error | complete)?`:
//! [`Subscriber`] is a shareable handle that also serializes delivery, and
//! [`AutoDetachObserver`] sits at every subscribe boundary and releases the
//! upstream subscription once a terminal notification went through.
use std::{
  cell::RefCell,
  collections::VecDeque,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::{Mutex, ReentrantMutex};

use crate::{
  error::RxError,
  notification::Notification,
  subscription::{SingleSubscription, Subscription, SubscriptionLike},
};

/// Observer trait: The consumer of data in reactive programming
pub trait Observer<T>: Send {
  fn next(&mut self, value: T);

  fn error(&mut self, err: RxError);

  fn complete(&mut self);

  /// Returns `true` if the observer will not accept more values. Sources
  /// poll this to stop producing early.
  fn is_closed(&self) -> bool { false }
}

pub type BoxedObserver<T> = Box<dyn Observer<T>>;

impl<T, O: Observer<T> + ?Sized> Observer<T> for Box<O> {
  #[inline]
  fn next(&mut self, value: T) { (**self).next(value) }
  #[inline]
  fn error(&mut self, err: RxError) { (**self).error(err) }
  #[inline]
  fn complete(&mut self) { (**self).complete() }
  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// Reports an error that reached an observer without an error handler.
pub(crate) fn report_unhandled(err: &RxError) {
  tracing::error!(error = %err, "unhandled error in observable sequence");
}

/// Observer built from a `next` closure. Errors go to the log.
pub struct FnMutObserver<F>(pub F);

impl<T, F> Observer<T> for FnMutObserver<F>
where
  F: FnMut(T) + Send,
{
  #[inline]
  fn next(&mut self, value: T) { (self.0)(value) }
  fn error(&mut self, err: RxError) { report_unhandled(&err) }
  fn complete(&mut self) {}
}

/// Observer built from three closures.
pub struct ObserverFns<N, E, C> {
  pub next: N,
  pub error: E,
  pub complete: C,
}

impl<T, N, E, C> Observer<T> for ObserverFns<N, E, C>
where
  N: FnMut(T) + Send,
  E: FnMut(RxError) + Send,
  C: FnMut() + Send,
{
  #[inline]
  fn next(&mut self, value: T) { (self.next)(value) }
  #[inline]
  fn error(&mut self, err: RxError) { (self.error)(err) }
  #[inline]
  fn complete(&mut self) { (self.complete)() }
}

/// A cloneable, thread-safe handle to one downstream observer.
///
/// Calls from different threads are serialized: a caller blocks while
/// another thread is inside the observer. A call made from inside one of the
/// observer's own callbacks is queued and delivered right after the current
/// callback returns, so delivery is never nested.
///
/// After `error` or `complete` the handle ignores further calls and drops the
/// observer.
pub struct Subscriber<T> {
  inner: Arc<SubscriberInner<T>>,
}

struct SubscriberInner<T> {
  slot: ReentrantMutex<RefCell<Option<BoxedObserver<T>>>>,
  queue: Mutex<VecDeque<Notification<T>>>,
  stopped: AtomicBool,
  disposed: AtomicBool,
}

impl<T> Clone for Subscriber<T> {
  fn clone(&self) -> Self { Subscriber { inner: self.inner.clone() } }
}

impl<T: Send + 'static> Subscriber<T> {
  pub fn new(observer: impl Observer<T> + 'static) -> Self { Self::from_boxed(Box::new(observer)) }

  pub fn from_boxed(observer: BoxedObserver<T>) -> Self {
    Subscriber {
      inner: Arc::new(SubscriberInner {
        slot: ReentrantMutex::new(RefCell::new(Some(observer))),
        queue: Mutex::new(VecDeque::new()),
        stopped: AtomicBool::new(false),
        disposed: AtomicBool::new(false),
      }),
    }
  }

  /// Stops delivery and drops the observer as soon as no callback is running.
  pub fn unsubscribe(&self) {
    self.inner.disposed.store(true, Ordering::Release);
    if let Some(guard) = self.inner.slot.try_lock() {
      if let Ok(mut slot) = guard.try_borrow_mut() {
        *slot = None;
      }
    }
  }

  pub fn is_closed(&self) -> bool {
    self.inner.stopped.load(Ordering::Acquire) || self.inner.disposed.load(Ordering::Acquire)
  }

  /// Subscription that unsubscribes this handle.
  pub fn as_subscription(&self) -> Subscription {
    let this = self.clone();
    Subscription::new(move || this.unsubscribe())
  }

  fn deliver(&self, notification: Notification<T>) {
    let guard = self.inner.slot.lock();
    let mut slot = match guard.try_borrow_mut() {
      Ok(slot) => slot,
      Err(_) => {
        // re-entrant call from inside a callback on this thread
        self.inner.queue.lock().push_back(notification);
        return;
      }
    };

    let mut current = Some(notification);
    while let Some(notification) = current.take() {
      if self.inner.disposed.load(Ordering::Acquire) {
        break;
      }
      let terminal = notification.is_terminal();
      if let Some(observer) = slot.as_mut() {
        notification.accept(observer.as_mut());
      }
      if terminal {
        *slot = None;
        break;
      }
      current = self.inner.queue.lock().pop_front();
    }

    if slot.is_none() || self.inner.disposed.load(Ordering::Acquire) {
      *slot = None;
      self.inner.queue.lock().clear();
    }
  }
}

impl<T: Send + 'static> Observer<T> for Subscriber<T> {
  fn next(&mut self, value: T) {
    if !self.is_closed() {
      self.deliver(Notification::Next(value));
    }
  }

  fn error(&mut self, err: RxError) {
    if !self.inner.stopped.swap(true, Ordering::AcqRel) {
      self.deliver(Notification::Error(err));
    }
  }

  fn complete(&mut self) {
    if !self.inner.stopped.swap(true, Ordering::AcqRel) {
      self.deliver(Notification::Complete);
    }
  }

  fn is_closed(&self) -> bool { Subscriber::is_closed(self) }
}

/// The observer installed at every subscribe boundary.
///
/// Gates the grammar through a [`Subscriber`] and, once a terminal
/// notification has been forwarded, releases the upstream subscription.
pub(crate) struct AutoDetachObserver<T> {
  pub(crate) subscriber: Subscriber<T>,
  pub(crate) upstream: SingleSubscription,
}

impl<T: Send + 'static> Observer<T> for AutoDetachObserver<T> {
  #[inline]
  fn next(&mut self, value: T) { self.subscriber.next(value) }

  fn error(&mut self, err: RxError) {
    self.subscriber.error(err);
    self.upstream.unsubscribe();
  }

  fn complete(&mut self) {
    self.subscriber.complete();
    self.upstream.unsubscribe();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.subscriber.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;

  use super::*;

  #[derive(Clone, Default)]
  struct Log(Arc<Mutex<Vec<Notification<i32>>>>);

  impl Observer<i32> for Log {
    fn next(&mut self, value: i32) { self.0.lock().push(Notification::Next(value)) }
    fn error(&mut self, err: RxError) { self.0.lock().push(Notification::Error(err)) }
    fn complete(&mut self) { self.0.lock().push(Notification::Complete) }
  }

  #[rxkit_macro::test]
  fn grammar_is_enforced() {
    let log = Log::default();
    let mut subscriber = Subscriber::new(log.clone());
    subscriber.next(1);
    subscriber.complete();
    subscriber.next(2);
    subscriber.error("late".into());
    subscriber.complete();
    assert_eq!(*log.0.lock(), vec![Notification::Next(1), Notification::Complete]);
    assert!(subscriber.is_closed());
  }

  #[rxkit_macro::test]
  fn unsubscribe_seals() {
    let log = Log::default();
    let mut subscriber = Subscriber::new(log.clone());
    subscriber.next(1);
    subscriber.unsubscribe();
    subscriber.next(2);
    subscriber.complete();
    assert_eq!(*log.0.lock(), vec![Notification::Next(1)]);
  }

  struct Echo {
    me: Arc<Mutex<Option<Subscriber<i32>>>>,
    seen: Arc<Mutex<Vec<i32>>>,
    depth: Arc<AtomicUsize>,
    max_depth: Arc<AtomicUsize>,
  }

  impl Observer<i32> for Echo {
    fn next(&mut self, value: i32) {
      let d = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
      self.max_depth.fetch_max(d, Ordering::SeqCst);
      self.seen.lock().push(value);
      if value < 3 {
        let me = self.me.lock().clone();
        if let Some(mut me) = me {
          me.next(value + 1);
        }
      }
      self.depth.fetch_sub(1, Ordering::SeqCst);
    }
    fn error(&mut self, _: RxError) {}
    fn complete(&mut self) {}
  }

  #[rxkit_macro::test]
  fn reentrant_calls_are_queued_not_nested() {
    let me = Arc::new(Mutex::new(None));
    let seen = Arc::new(Mutex::new(vec![]));
    let max_depth = Arc::new(AtomicUsize::new(0));
    let mut subscriber = Subscriber::new(Echo {
      me: me.clone(),
      seen: seen.clone(),
      depth: Arc::new(AtomicUsize::new(0)),
      max_depth: max_depth.clone(),
    });
    *me.lock() = Some(subscriber.clone());
    subscriber.next(0);
    assert_eq!(*seen.lock(), vec![0, 1, 2, 3]);
    assert_eq!(max_depth.load(Ordering::SeqCst), 1);
    me.lock().take();
  }

  #[rxkit_macro::test]
  fn concurrent_feeders_never_overlap() {
    let busy = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let count = Arc::new(AtomicUsize::new(0));
    let (b, o, c) = (busy.clone(), overlaps.clone(), count.clone());
    let subscriber = Subscriber::new(FnMutObserver(move |_: usize| {
      if b.swap(true, Ordering::SeqCst) {
        o.fetch_add(1, Ordering::SeqCst);
      }
      c.fetch_add(1, Ordering::SeqCst);
      b.store(false, Ordering::SeqCst);
    }));
    let handles: Vec<_> = (0..4)
      .map(|_| {
        let mut s = subscriber.clone();
        std::thread::spawn(move || (0..250).for_each(|i| s.next(i)))
      })
      .collect();
    handles.into_iter().for_each(|h| h.join().unwrap());
    assert_eq!(count.load(Ordering::SeqCst), 1000);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
  }
}
