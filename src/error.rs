//! Error values carried by `Error` notifications.
//!
//! Every user function an operator takes comes in two versions. The plain
//! version receives a closure that cannot fail, e.g. `map`. The `try_`
//! version receives a closure returning `Result<_, RxError>`, e.g. `try_map`;
//! an `Err` is delivered downstream as an `Error` notification and the
//! operator stops. Both versions share one implementation: the plain closure
//! is wrapped so it always returns `Ok`.
use std::{error::Error, fmt, sync::Arc};

use thiserror::Error;

#[derive(Error, Clone)]
pub enum RxError {
  /// A reason supplied by user code.
  #[error("{0}")]
  Message(Arc<str>),

  /// A foreign error wrapped for transport through a stream.
  #[error("{0}")]
  Source(Arc<dyn Error + Send + Sync>),

  /// The subject (or other resource) was used after `dispose`.
  #[error("object has been disposed")]
  Disposed,

  #[error("sequence contains no elements")]
  SequenceContainsNoElements,

  #[error("sequence contains more than one element")]
  SequenceContainsMoreThanOneElement,

  /// No notification arrived before a `timeout` elapsed.
  #[error("timeout")]
  Timeout,

  #[error("argument out of range")]
  ArgumentOutOfRange,
}

impl RxError {
  pub fn msg(reason: impl Into<String>) -> Self { RxError::Message(reason.into().into()) }

  pub fn wrap<E: Error + Send + Sync + 'static>(err: E) -> Self { RxError::Source(Arc::new(err)) }
}

impl fmt::Debug for RxError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RxError::Message(m) => f.debug_tuple("Message").field(m).finish(),
      RxError::Source(e) => f.debug_tuple("Source").field(&e.to_string()).finish(),
      RxError::Disposed => f.write_str("Disposed"),
      RxError::SequenceContainsNoElements => f.write_str("SequenceContainsNoElements"),
      RxError::SequenceContainsMoreThanOneElement => f.write_str("SequenceContainsMoreThanOneElement"),
      RxError::Timeout => f.write_str("Timeout"),
      RxError::ArgumentOutOfRange => f.write_str("ArgumentOutOfRange"),
    }
  }
}

impl PartialEq for RxError {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (RxError::Message(a), RxError::Message(b)) => a == b,
      (RxError::Source(a), RxError::Source(b)) => {
        Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
      }
      (RxError::Disposed, RxError::Disposed)
      | (RxError::SequenceContainsNoElements, RxError::SequenceContainsNoElements)
      | (RxError::SequenceContainsMoreThanOneElement, RxError::SequenceContainsMoreThanOneElement)
      | (RxError::Timeout, RxError::Timeout)
      | (RxError::ArgumentOutOfRange, RxError::ArgumentOutOfRange) => true,
      _ => false,
    }
  }
}

impl From<&str> for RxError {
  fn from(reason: &str) -> Self { RxError::Message(reason.into()) }
}

impl From<String> for RxError {
  fn from(reason: String) -> Self { RxError::Message(reason.into()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("io went away")]
  struct IoGone;

  #[rxkit_macro::test]
  fn message_equality() {
    assert_eq!(RxError::from("ex"), RxError::msg("ex"));
    assert_ne!(RxError::from("ex"), RxError::Disposed);
    assert_eq!(RxError::from("ex").to_string(), "ex");
  }

  #[rxkit_macro::test]
  fn wrapped_errors_compare_by_display() {
    let a = RxError::wrap(IoGone);
    let b = RxError::wrap(IoGone);
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "io went away");
    assert_eq!(format!("{:?}", a), "Source(\"io went away\")");
  }
}
