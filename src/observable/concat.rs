//! Sequential subscription to a series of sources.
//!
//! One engine backs `concat`, `repeat`, `while_do`, `retry`, `catch` and
//! `on_error_resume_next`. The sources come from an iterator created per
//! subscription; what moves the engine on to the next source (completion,
//! error or both) is the only difference between them. Resubscription is
//! trampolined, so a long run of synchronous sources does not grow the
//! stack.
use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::{CurrentThreadScheduler, Scheduler, SchedulerRef},
  subscription::{SerialSubscription, Subscription, SubscriptionLike},
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Advance {
  OnComplete,
  OnError,
  OnEither,
}

type SourcesFactory<T> =
  dyn Fn() -> Box<dyn Iterator<Item = Observable<T>> + Send> + Send + Sync;

struct SequentialOp<T> {
  sources: Arc<SourcesFactory<T>>,
  advance: Advance,
}

struct Sequential<T> {
  sources: Mutex<Box<dyn Iterator<Item = Observable<T>> + Send>>,
  observer: Subscriber<T>,
  serial: SerialSubscription,
  trampoline: CurrentThreadScheduler,
  scheduler: Option<SchedulerRef>,
  advance: Advance,
  last_error: Mutex<Option<RxError>>,
  closed: AtomicBool,
}

struct SequentialObserver<T> {
  state: Arc<Sequential<T>>,
}

/// Subscribes to each source in turn, moving to the next one when the
/// current one completes. An error ends the whole sequence.
pub fn concat<T: Send + 'static>(sources: Vec<Observable<T>>) -> Observable<T> {
  concat_iter(move || sources.clone().into_iter())
}

/// [`concat`] over sources produced lazily by `factory`, which is called
/// once per subscription.
pub fn concat_iter<T, F, I>(factory: F) -> Observable<T>
where
  T: Send + 'static,
  F: Fn() -> I + Send + Sync + 'static,
  I: Iterator<Item = Observable<T>> + Send + 'static,
{
  sequential(factory, Advance::OnComplete)
}

/// Subscribes to each source in turn, moving to the next one when the
/// current one errors. Completion ends the sequence; when the sources run
/// out after an error, that last error is delivered.
pub fn catch_iter<T, F, I>(factory: F) -> Observable<T>
where
  T: Send + 'static,
  F: Fn() -> I + Send + Sync + 'static,
  I: Iterator<Item = Observable<T>> + Send + 'static,
{
  sequential(factory, Advance::OnError)
}

/// Continues with the next source whether the current one completes or
/// errors; errors are swallowed.
pub fn on_error_resume_next<T: Send + 'static>(sources: Vec<Observable<T>>) -> Observable<T> {
  sequential(move || sources.clone().into_iter(), Advance::OnEither)
}

fn sequential<T, F, I>(factory: F, advance: Advance) -> Observable<T>
where
  T: Send + 'static,
  F: Fn() -> I + Send + Sync + 'static,
  I: Iterator<Item = Observable<T>> + Send + 'static,
{
  let sources: Arc<SourcesFactory<T>> = Arc::new(move || Box::new(factory()));
  Observable::new(SequentialOp { sources, advance })
}

impl<T: Send + 'static> CoreObservable<T> for SequentialOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let state = Arc::new(Sequential {
      sources: Mutex::new((self.sources)()),
      observer: Subscriber::from_boxed(observer),
      serial: SerialSubscription::new(),
      trampoline: CurrentThreadScheduler::new(),
      scheduler,
      advance: self.advance,
      last_error: Mutex::new(None),
      closed: AtomicBool::new(false),
    });
    state.schedule_next();
    Subscription::new(move || {
      state.closed.store(true, Ordering::Release);
      state.serial.unsubscribe();
      state.observer.unsubscribe();
    })
  }
}

impl<T: Send + 'static> Sequential<T> {
  fn schedule_next(self: &Arc<Self>) {
    let this = self.clone();
    self.trampoline.schedule(Box::new(move || this.subscribe_next()));
  }

  fn subscribe_next(self: &Arc<Self>) {
    if self.closed.load(Ordering::Acquire) || self.observer.is_closed() {
      return;
    }
    let next = self.sources.lock().next();
    let mut observer = self.observer.clone();
    match next {
      Some(source) => {
        let inner = SequentialObserver { state: self.clone() };
        let subscription = source.subscribe_gated(Box::new(inner), self.scheduler.clone());
        self.serial.set(subscription);
      }
      None => {
        let last_error = self.last_error.lock().take();
        match last_error {
          Some(err) if self.advance == Advance::OnError => observer.error(err),
          _ => observer.complete(),
        }
      }
    }
  }
}

impl<T: Send + 'static> Observer<T> for SequentialObserver<T> {
  fn next(&mut self, value: T) { self.state.observer.clone().next(value) }

  fn error(&mut self, err: RxError) {
    if self.state.advance == Advance::OnComplete {
      self.state.observer.clone().error(err);
    } else {
      *self.state.last_error.lock() = Some(err);
      self.state.schedule_next();
    }
  }

  fn complete(&mut self) {
    if self.state.advance == Advance::OnError {
      self.state.observer.clone().complete();
    } else {
      self.state.schedule_next();
    }
  }

  fn is_closed(&self) -> bool { self.state.observer.is_closed() }
}
