use crate::observer::Subscriber;

/// Subscribers of one subject, in subscription order, keyed by id.
pub(crate) struct Subscribers<T> {
  next_id: usize,
  list: Vec<(usize, Subscriber<T>)>,
}

impl<T> Default for Subscribers<T> {
  fn default() -> Self { Subscribers { next_id: 0, list: vec![] } }
}

impl<T> Subscribers<T> {
  pub(crate) fn add(&mut self, observer: Subscriber<T>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.list.push((id, observer));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<Subscriber<T>> {
    let index = self.list.iter().position(|(i, _)| *i == id)?;
    Some(self.list.remove(index).1)
  }

  pub(crate) fn snapshot(&self) -> Vec<Subscriber<T>> {
    self.list.iter().map(|(_, s)| s.clone()).collect()
  }

  pub(crate) fn drain(&mut self) -> Vec<Subscriber<T>> {
    self.list.drain(..).map(|(_, s)| s).collect()
  }

  pub(crate) fn len(&self) -> usize { self.list.len() }
}
