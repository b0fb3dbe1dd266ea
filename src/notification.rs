use crate::{error::RxError, observer::Observer};

/// A materialized observer call.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification<T> {
  Next(T),
  Error(RxError),
  Complete,
}

impl<T> Notification<T> {
  /// Replays this notification on `observer`.
  pub fn accept<O: Observer<T> + ?Sized>(self, observer: &mut O) {
    match self {
      Notification::Next(v) => observer.next(v),
      Notification::Error(e) => observer.error(e),
      Notification::Complete => observer.complete(),
    }
  }

  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Notification<U> {
    match self {
      Notification::Next(v) => Notification::Next(f(v)),
      Notification::Error(e) => Notification::Error(e),
      Notification::Complete => Notification::Complete,
    }
  }

  pub fn value(&self) -> Option<&T> {
    match self {
      Notification::Next(v) => Some(v),
      _ => None,
    }
  }
}
