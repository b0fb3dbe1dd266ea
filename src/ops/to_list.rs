use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

struct ToListOp<T> {
  source: Observable<T>,
}

struct ToListObserver<T> {
  observer: BoxedObserver<Vec<T>>,
  items: Vec<T>,
}

impl<T: Send + 'static> Observable<T> {
  /// Collects every value and emits them as one `Vec` when the source
  /// completes.
  pub fn to_list(&self) -> Observable<Vec<T>> { Observable::new(ToListOp { source: self.clone() }) }
}

impl<T: Send + 'static> CoreObservable<Vec<T>> for ToListOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<Vec<T>>, scheduler: Option<SchedulerRef>) -> Subscription {
    self.source.actual_subscribe(Box::new(ToListObserver { observer, items: vec![] }), scheduler)
  }
}

impl<T: Send> Observer<T> for ToListObserver<T> {
  fn next(&mut self, value: T) { self.items.push(value) }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) {
    self.observer.next(std::mem::take(&mut self.items));
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::{
    observable::empty,
    testing::{ReactiveTest, TestScheduler},
  };

  #[rxkit_macro::test]
  fn collects_on_completion() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(220, 2),
      ReactiveTest::on_completed(250),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.to_list());
    assert_eq!(res.messages(), vec![ReactiveTest::on_next(250, vec![1, 2]), ReactiveTest::on_completed(250)]);
  }

  #[rxkit_macro::test]
  fn empty_source_gives_empty_list() {
    let scheduler = TestScheduler::new();
    let res = scheduler.start(|| empty::<i32>().to_list());
    assert_eq!(res.messages(), vec![ReactiveTest::on_next(201, vec![]), ReactiveTest::on_completed(201)]);
  }
}
