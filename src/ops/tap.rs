use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

type NextFn<T> = dyn Fn(&T) -> Result<(), RxError> + Send + Sync;
type ErrorFn = dyn Fn(&RxError) + Send + Sync;
type CompleteFn = dyn Fn() + Send + Sync;

struct Hooks<T> {
  next: Option<Arc<NextFn<T>>>,
  error: Option<Arc<ErrorFn>>,
  complete: Option<Arc<CompleteFn>>,
}

impl<T> Clone for Hooks<T> {
  fn clone(&self) -> Self {
    Hooks { next: self.next.clone(), error: self.error.clone(), complete: self.complete.clone() }
  }
}

struct TapOp<T> {
  source: Observable<T>,
  hooks: Hooks<T>,
}

struct TapObserver<T> {
  observer: BoxedObserver<T>,
  hooks: Hooks<T>,
  done: bool,
}

impl<T: Send + 'static> Observable<T> {
  /// Calls `f` with a reference to each value before forwarding it.
  pub fn tap(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Observable<T> {
    self.try_tap(move |v| {
      f(v);
      Ok(())
    })
  }

  /// Like [`tap`](Self::tap); an `Err` from `f` ends the stream with that
  /// error.
  pub fn try_tap(&self, f: impl Fn(&T) -> Result<(), RxError> + Send + Sync + 'static) -> Observable<T> {
    self.with_hooks(Hooks { next: Some(Arc::new(f)), error: None, complete: None })
  }

  pub fn tap_error(&self, f: impl Fn(&RxError) + Send + Sync + 'static) -> Observable<T> {
    self.with_hooks(Hooks { next: None, error: Some(Arc::new(f)), complete: None })
  }

  pub fn tap_complete(&self, f: impl Fn() + Send + Sync + 'static) -> Observable<T> {
    self.with_hooks(Hooks { next: None, error: None, complete: Some(Arc::new(f)) })
  }

  fn with_hooks(&self, hooks: Hooks<T>) -> Observable<T> { Observable::new(TapOp { source: self.clone(), hooks }) }
}

impl<T: Send + 'static> CoreObservable<T> for TapOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = TapObserver { observer, hooks: self.hooks.clone(), done: false };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T> Observer<T> for TapObserver<T> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    if let Some(f) = &self.hooks.next {
      if let Err(err) = f(&value) {
        self.done = true;
        self.observer.error(err);
        return;
      }
    }
    self.observer.next(value);
  }

  fn error(&mut self, err: RxError) {
    if let Some(f) = &self.hooks.error {
      f(&err);
    }
    self.observer.error(err);
  }

  fn complete(&mut self) {
    if let Some(f) = &self.hooks.complete {
      f();
    }
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.done || self.observer.is_closed() }
}
