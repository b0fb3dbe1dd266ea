//! Windowing: splitting a source into a stream of inner observables.
//!
//! Every window is a [`Subject`] handed downstream through [`add_ref`], so
//! the source stays subscribed while any window is still observed, even
//! after the outer subscription was released.
use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{throw, CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  ops::add_ref,
  scheduler::{timeout_or, SchedulerRef},
  subject::Subject,
  subscription::{
    CompositeSubscription, RefCountSubscription, SerialSubscription, SingleSubscription, Subscription, SubscriptionLike,
  },
};

struct WindowOp<T, B> {
  source: Observable<T>,
  boundaries: Observable<B>,
}

struct WindowState<T> {
  observer: Subscriber<Observable<T>>,
  current: Mutex<Subject<T>>,
  ref_count: RefCountSubscription,
}

struct WindowSourceObserver<T>(Arc<WindowState<T>>);

struct BoundaryObserver<T>(Arc<WindowState<T>>);

struct WindowWithCountOp<T> {
  source: Observable<T>,
  count: usize,
  skip: usize,
}

struct WindowWithCountObserver<T> {
  observer: BoxedObserver<Observable<T>>,
  ref_count: RefCountSubscription,
  windows: VecDeque<Subject<T>>,
  count: usize,
  skip: usize,
  n: usize,
}

struct WindowWithTimeOp<T> {
  source: Observable<T>,
  span: Duration,
  shift: Duration,
  scheduler: Option<SchedulerRef>,
}

struct WindowWithTime<T> {
  observer: Subscriber<Observable<T>>,
  windows: Mutex<VecDeque<Subject<T>>>,
  ref_count: RefCountSubscription,
  timer: SerialSubscription,
  scheduler: SchedulerRef,
  shift: Duration,
  clock: Mutex<WindowClock>,
}

/// Offsets from subscription of the next window close and open.
struct WindowClock {
  next_span: Duration,
  next_shift: Duration,
  total: Duration,
}

struct WindowWithTimeObserver<T>(Arc<WindowWithTime<T>>);

struct WindowWithTimeOrCountOp<T> {
  source: Observable<T>,
  span: Duration,
  count: usize,
  scheduler: Option<SchedulerRef>,
}

struct WindowWithTimeOrCount<T> {
  observer: Subscriber<Observable<T>>,
  ref_count: RefCountSubscription,
  timer: SerialSubscription,
  scheduler: SchedulerRef,
  span: Duration,
  count: usize,
  current: Mutex<CurrentWindow<T>>,
}

/// The open window, how many values it holds and the id of the timer that
/// may close it.
struct CurrentWindow<T> {
  window: Subject<T>,
  n: usize,
  id: u64,
}

struct WindowWithTimeOrCountObserver<T>(Arc<WindowWithTimeOrCount<T>>);

fn open_window<T: Clone + Send + Sync + 'static>(
  observer: &mut impl Observer<Observable<T>>, ref_count: &RefCountSubscription,
) -> Subject<T> {
  let window = Subject::new();
  observer.next(add_ref(window.as_observable(), ref_count));
  window
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
  /// Splits the source into consecutive windows. The first window opens at
  /// subscription; every value of `boundaries` closes the current window
  /// and opens the next one.
  pub fn window<B: Send + 'static>(&self, boundaries: Observable<B>) -> Observable<Observable<T>> {
    Observable::new(WindowOp { source: self.clone(), boundaries })
  }

  /// Windows of `count` values, a new one starting every `skip` values
  /// (default `count`). A zero `count` or `skip` errors with
  /// [`RxError::ArgumentOutOfRange`].
  pub fn window_with_count(&self, count: usize, skip: Option<usize>) -> Observable<Observable<T>> {
    let skip = skip.unwrap_or(count);
    if count == 0 || skip == 0 {
      return throw(RxError::ArgumentOutOfRange);
    }
    Observable::new(WindowWithCountOp { source: self.clone(), count, skip })
  }

  /// Windows lasting `span`, a new one opening every `shift` (default
  /// `span`). Timers run on the subscribe scheduler, or on a new thread
  /// when there is none.
  pub fn window_with_time(&self, span: Duration, shift: Option<Duration>) -> Observable<Observable<T>> {
    self.window_with_time_on(span, shift, None)
  }

  /// [`window_with_time`](Self::window_with_time) with its timers on
  /// `scheduler`.
  pub fn window_with_time_on(
    &self, span: Duration, shift: Option<Duration>, scheduler: Option<SchedulerRef>,
  ) -> Observable<Observable<T>> {
    Observable::new(WindowWithTimeOp { source: self.clone(), span, shift: shift.unwrap_or(span), scheduler })
  }

  /// Consecutive windows, each closed after `span` or once it holds `count`
  /// values, whichever comes first. Filling a window restarts the timer. A
  /// zero `count` errors with [`RxError::ArgumentOutOfRange`].
  pub fn window_with_time_or_count(&self, span: Duration, count: usize) -> Observable<Observable<T>> {
    self.window_with_time_or_count_on(span, count, None)
  }

  pub fn window_with_time_or_count_on(
    &self, span: Duration, count: usize, scheduler: Option<SchedulerRef>,
  ) -> Observable<Observable<T>> {
    if count == 0 {
      return throw(RxError::ArgumentOutOfRange);
    }
    Observable::new(WindowWithTimeOrCountOp { source: self.clone(), span, count, scheduler })
  }
}

impl<T: Clone + Send + Sync + 'static, B: Send + 'static> CoreObservable<Observable<T>> for WindowOp<T, B> {
  fn actual_subscribe(
    &self, observer: BoxedObserver<Observable<T>>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let mut observer = Subscriber::from_boxed(observer);
    let group = CompositeSubscription::new();
    let ref_count = RefCountSubscription::new(group.clone().into());
    let first = open_window(&mut observer, &ref_count);
    let state = Arc::new(WindowState { observer, current: Mutex::new(first), ref_count: ref_count.clone() });
    group.add(self.source.subscribe_gated(Box::new(WindowSourceObserver(state.clone())), scheduler.clone()));
    group.add(self.boundaries.subscribe_gated(Box::new(BoundaryObserver(state)), scheduler));
    ref_count.into()
  }
}

impl<T: Clone + Send + Sync + 'static> WindowState<T> {
  fn current(&self) -> Subject<T> { self.current.lock().clone() }

  fn error(&self, err: RxError) {
    self.current().error(err.clone());
    self.observer.clone().error(err);
  }

  fn complete(&self) {
    self.current().complete();
    self.observer.clone().complete();
  }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for WindowSourceObserver<T> {
  fn next(&mut self, value: T) { self.0.current().next(value) }

  fn error(&mut self, err: RxError) { self.0.error(err) }

  fn complete(&mut self) { self.0.complete() }

  fn is_closed(&self) -> bool { self.0.ref_count.is_closed() }
}

impl<T: Clone + Send + Sync + 'static, B> Observer<B> for BoundaryObserver<T> {
  fn next(&mut self, _: B) {
    self.0.current().complete();
    let mut observer = self.0.observer.clone();
    let window = open_window(&mut observer, &self.0.ref_count);
    *self.0.current.lock() = window;
  }

  fn error(&mut self, err: RxError) { self.0.error(err) }

  fn complete(&mut self) { self.0.complete() }

  fn is_closed(&self) -> bool { self.0.ref_count.is_closed() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<Observable<T>> for WindowWithCountOp<T> {
  fn actual_subscribe(
    &self, observer: BoxedObserver<Observable<T>>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let source = SingleSubscription::new();
    let ref_count = RefCountSubscription::new(source.clone().into());
    let mut observer = WindowWithCountObserver {
      observer,
      ref_count: ref_count.clone(),
      windows: VecDeque::new(),
      count: self.count,
      skip: self.skip,
      n: 0,
    };
    observer.open();
    source.set(self.source.subscribe_gated(Box::new(observer), scheduler));
    ref_count.into()
  }
}

impl<T: Clone + Send + Sync + 'static> WindowWithCountObserver<T> {
  fn open(&mut self) {
    let window = open_window(&mut self.observer, &self.ref_count);
    self.windows.push_back(window);
  }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for WindowWithCountObserver<T> {
  fn next(&mut self, value: T) {
    for window in self.windows.iter_mut() {
      window.next(value.clone());
    }
    if self.n + 1 >= self.count && (self.n + 1 - self.count) % self.skip == 0 {
      if let Some(mut window) = self.windows.pop_front() {
        window.complete();
      }
    }
    self.n += 1;
    if self.n % self.skip == 0 {
      self.open();
    }
  }

  fn error(&mut self, err: RxError) {
    while let Some(mut window) = self.windows.pop_front() {
      window.error(err.clone());
    }
    self.observer.error(err);
  }

  fn complete(&mut self) {
    while let Some(mut window) = self.windows.pop_front() {
      window.complete();
    }
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.ref_count.is_closed() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<Observable<T>> for WindowWithTimeOp<T> {
  fn actual_subscribe(
    &self, observer: BoxedObserver<Observable<T>>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let timer = SerialSubscription::new();
    let group = CompositeSubscription::new();
    group.add(timer.clone().into());
    let ref_count = RefCountSubscription::new(group.clone().into());
    let mut observer = Subscriber::from_boxed(observer);
    let first = open_window(&mut observer, &ref_count);
    let state = Arc::new(WindowWithTime {
      observer,
      windows: Mutex::new(VecDeque::from([first])),
      ref_count: ref_count.clone(),
      timer,
      scheduler: timeout_or(&self.scheduler.clone().or_else(|| scheduler.clone())),
      shift: self.shift,
      clock: Mutex::new(WindowClock { next_span: self.span, next_shift: self.shift, total: Duration::ZERO }),
    });
    state.create_timer();
    group.add(self.source.subscribe_gated(Box::new(WindowWithTimeObserver(state)), scheduler));
    ref_count.into()
  }
}

impl<T: Clone + Send + Sync + 'static> WindowWithTime<T> {
  fn create_timer(self: &Arc<Self>) {
    let (delay, is_span, is_shift) = {
      let mut clock = self.clock.lock();
      let is_span = clock.next_span <= clock.next_shift;
      let is_shift = clock.next_shift <= clock.next_span;
      let due = if is_span { clock.next_span } else { clock.next_shift };
      let delay = due - clock.total;
      clock.total = due;
      if is_span {
        clock.next_span += self.shift;
      }
      if is_shift {
        clock.next_shift += self.shift;
      }
      (delay, is_span, is_shift)
    };
    let this = self.clone();
    let handle = self.scheduler.schedule_relative(
      delay,
      Box::new(move || {
        if is_shift {
          let mut observer = this.observer.clone();
          let window = open_window(&mut observer, &this.ref_count);
          this.windows.lock().push_back(window);
        }
        if is_span {
          let closing = this.windows.lock().pop_front();
          if let Some(mut window) = closing {
            window.complete();
          }
        }
        this.create_timer();
      }),
    );
    self.timer.set(handle);
  }

  fn drain(&self) -> VecDeque<Subject<T>> { std::mem::take(&mut *self.windows.lock()) }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for WindowWithTimeObserver<T> {
  fn next(&mut self, value: T) {
    let windows: Vec<Subject<T>> = self.0.windows.lock().iter().cloned().collect();
    for mut window in windows {
      window.next(value.clone());
    }
  }

  fn error(&mut self, err: RxError) {
    for mut window in self.0.drain() {
      window.error(err.clone());
    }
    self.0.observer.clone().error(err);
  }

  fn complete(&mut self) {
    for mut window in self.0.drain() {
      window.complete();
    }
    self.0.observer.clone().complete();
  }

  fn is_closed(&self) -> bool { self.0.ref_count.is_closed() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<Observable<T>> for WindowWithTimeOrCountOp<T> {
  fn actual_subscribe(
    &self, observer: BoxedObserver<Observable<T>>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let timer = SerialSubscription::new();
    let group = CompositeSubscription::new();
    group.add(timer.clone().into());
    let ref_count = RefCountSubscription::new(group.clone().into());
    let mut observer = Subscriber::from_boxed(observer);
    let first = open_window(&mut observer, &ref_count);
    let state = Arc::new(WindowWithTimeOrCount {
      observer,
      ref_count: ref_count.clone(),
      timer,
      scheduler: timeout_or(&self.scheduler.clone().or_else(|| scheduler.clone())),
      span: self.span,
      count: self.count,
      current: Mutex::new(CurrentWindow { window: first, n: 0, id: 0 }),
    });
    state.create_timer(0);
    group.add(self.source.subscribe_gated(Box::new(WindowWithTimeOrCountObserver(state)), scheduler));
    ref_count.into()
  }
}

impl<T: Clone + Send + Sync + 'static> WindowWithTimeOrCount<T> {
  fn create_timer(self: &Arc<Self>, id: u64) {
    let this = self.clone();
    let handle = self.scheduler.schedule_relative(
      self.span,
      Box::new(move || {
        if let Some(next) = this.rotate(Some(id)) {
          this.create_timer(next);
        }
      }),
    );
    self.timer.set(handle);
  }

  /// Closes the current window and opens the next one, returning the new
  /// timer id. A timer whose id is stale closes nothing.
  fn rotate(&self, timer: Option<u64>) -> Option<u64> {
    let (mut closing, opened, id) = {
      let mut current = self.current.lock();
      if matches!(timer, Some(id) if id != current.id) {
        return None;
      }
      current.n = 0;
      current.id += 1;
      let closing = std::mem::replace(&mut current.window, Subject::new());
      (closing, current.window.clone(), current.id)
    };
    closing.complete();
    self.observer.clone().next(add_ref(opened.as_observable(), &self.ref_count));
    Some(id)
  }

  fn current(&self) -> Subject<T> { self.current.lock().window.clone() }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for WindowWithTimeOrCountObserver<T> {
  fn next(&mut self, value: T) {
    let (mut window, full) = {
      let mut current = self.0.current.lock();
      current.n += 1;
      (current.window.clone(), current.n == self.0.count)
    };
    window.next(value);
    if full {
      if let Some(id) = self.0.rotate(None) {
        self.0.create_timer(id);
      }
    }
  }

  fn error(&mut self, err: RxError) {
    self.0.timer.unsubscribe();
    self.0.current().error(err.clone());
    self.0.observer.clone().error(err);
  }

  fn complete(&mut self) {
    self.0.timer.unsubscribe();
    self.0.current().complete();
    self.0.observer.clone().complete();
  }

  fn is_closed(&self) -> bool { self.0.ref_count.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable::of,
    testing::{ticks, ReactiveTest, TestScheduler},
  };

  fn hot_source(scheduler: &TestScheduler) -> crate::testing::HotObservable<i32> {
    scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(100, 1),
      ReactiveTest::on_next(210, 2),
      ReactiveTest::on_next(240, 3),
      ReactiveTest::on_next(280, 4),
      ReactiveTest::on_next(320, 5),
      ReactiveTest::on_next(350, 6),
      ReactiveTest::on_next(380, 7),
      ReactiveTest::on_next(420, 8),
      ReactiveTest::on_next(470, 9),
      ReactiveTest::on_completed(600),
    ])
  }

  fn labelled(windows: Observable<Observable<i32>>) -> Observable<String> {
    windows.map_indexed(|w, i| w.map(move |x| format!("{i} {x}"))).merge_all()
  }

  #[rxkit_macro::test]
  fn boundaries_split_the_source() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(90, 1),
      ReactiveTest::on_next(180, 2),
      ReactiveTest::on_next(250, 3),
      ReactiveTest::on_next(260, 4),
      ReactiveTest::on_next(310, 5),
      ReactiveTest::on_next(340, 6),
      ReactiveTest::on_next(410, 7),
      ReactiveTest::on_next(420, 8),
      ReactiveTest::on_next(470, 9),
      ReactiveTest::on_next(550, 10),
      ReactiveTest::on_completed(590),
    ]);
    let ys = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(255, true),
      ReactiveTest::on_next(330, true),
      ReactiveTest::on_next(350, true),
      ReactiveTest::on_next(400, true),
      ReactiveTest::on_next(500, true),
      ReactiveTest::on_completed(900),
    ]);
    let (src, boundaries) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || labelled(src.window(boundaries.clone())));
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(250, "0 3".to_string()),
        ReactiveTest::on_next(260, "1 4".to_string()),
        ReactiveTest::on_next(310, "1 5".to_string()),
        ReactiveTest::on_next(340, "2 6".to_string()),
        ReactiveTest::on_next(410, "4 7".to_string()),
        ReactiveTest::on_next(420, "4 8".to_string()),
        ReactiveTest::on_next(470, "4 9".to_string()),
        ReactiveTest::on_next(550, "5 10".to_string()),
        ReactiveTest::on_completed(590),
      ]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 590)]);
    assert_eq!(ys.subscriptions(), vec![ReactiveTest::subscribe(200, 590)]);
  }

  #[rxkit_macro::test]
  fn overlapping_count_windows() {
    let scheduler = TestScheduler::new();
    let xs = hot_source(&scheduler);
    let src = xs.as_observable();
    let res = scheduler.start(move || labelled(src.window_with_count(3, Some(2))));
    let expected: Vec<_> = [
      (210, "0 2"),
      (240, "0 3"),
      (280, "0 4"),
      (280, "1 4"),
      (320, "1 5"),
      (350, "1 6"),
      (350, "2 6"),
      (380, "2 7"),
      (420, "2 8"),
      (420, "3 8"),
      (470, "3 9"),
    ]
    .into_iter()
    .map(|(t, v)| ReactiveTest::on_next(t, v.to_string()))
    .chain([ReactiveTest::on_completed(600)])
    .collect();
    assert_eq!(res.messages(), expected);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 600)]);
  }

  #[rxkit_macro::test]
  fn zero_count_is_rejected() {
    let scheduler = TestScheduler::new();
    let res = scheduler.start(|| of(1).window_with_count(0, None).merge_all());
    assert_eq!(res.messages(), vec![ReactiveTest::on_error(200, RxError::ArgumentOutOfRange)]);
  }

  #[rxkit_macro::test]
  fn time_windows_with_shift() {
    let scheduler = TestScheduler::new();
    let xs = hot_source(&scheduler);
    let src = xs.as_observable();
    let res = scheduler.start(move || labelled(src.window_with_time(ticks(100), Some(ticks(70)))));
    let expected: Vec<_> = [
      (210, "0 2"),
      (240, "0 3"),
      (280, "0 4"),
      (280, "1 4"),
      (320, "1 5"),
      (350, "1 6"),
      (350, "2 6"),
      (380, "2 7"),
      (420, "2 8"),
      (420, "3 8"),
      (470, "3 9"),
    ]
    .into_iter()
    .map(|(t, v)| ReactiveTest::on_next(t, v.to_string()))
    .chain([ReactiveTest::on_completed(600)])
    .collect();
    assert_eq!(res.messages(), expected);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 600)]);
  }

  #[rxkit_macro::test]
  fn window_end_marks_with_overlap() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(150, 1),
      ReactiveTest::on_next(210, 2),
      ReactiveTest::on_next(240, 3),
      ReactiveTest::on_next(270, 4),
      ReactiveTest::on_next(320, 5),
      ReactiveTest::on_next(360, 6),
      ReactiveTest::on_next(390, 7),
      ReactiveTest::on_next(410, 8),
      ReactiveTest::on_next(460, 9),
      ReactiveTest::on_next(470, 10),
      ReactiveTest::on_completed(490),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || {
      src
        .window_with_time(ticks(100), Some(ticks(50)))
        .map_indexed(|w, i| w.map(move |x| format!("{i} {x}")).concat_with(of(format!("{i} end"))))
        .merge_all()
    });
    let expected: Vec<_> = [
      (210, "0 2"),
      (240, "0 3"),
      (270, "0 4"),
      (270, "1 4"),
      (300, "0 end"),
      (320, "1 5"),
      (320, "2 5"),
      (350, "1 end"),
      (360, "2 6"),
      (360, "3 6"),
      (390, "2 7"),
      (390, "3 7"),
      (400, "2 end"),
      (410, "3 8"),
      (410, "4 8"),
      (450, "3 end"),
      (460, "4 9"),
      (460, "5 9"),
      (470, "4 10"),
      (470, "5 10"),
      (490, "4 end"),
      (490, "5 end"),
    ]
    .into_iter()
    .map(|(t, v)| ReactiveTest::on_next(t, v.to_string()))
    .chain([ReactiveTest::on_completed(490)])
    .collect();
    assert_eq!(res.messages(), expected);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 490)]);
  }

  #[rxkit_macro::test]
  fn disposing_releases_the_source() {
    let scheduler = TestScheduler::new();
    let xs = hot_source(&scheduler);
    let src = xs.as_observable();
    let res = scheduler.start_with_timing(
      move || labelled(src.window_with_time(ticks(100), Some(ticks(70)))),
      crate::testing::Timing { disposed: 370, ..Default::default() },
    );
    assert_eq!(res.len(), 7);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 370)]);
  }

  #[rxkit_macro::test]
  fn time_or_count_windows() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(205, 1),
      ReactiveTest::on_next(210, 2),
      ReactiveTest::on_next(240, 3),
      ReactiveTest::on_next(280, 4),
      ReactiveTest::on_next(320, 5),
      ReactiveTest::on_next(350, 6),
      ReactiveTest::on_next(370, 7),
      ReactiveTest::on_next(420, 8),
      ReactiveTest::on_next(470, 9),
      ReactiveTest::on_completed(600),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || labelled(src.window_with_time_or_count(ticks(70), 3)));
    let expected: Vec<_> = [
      (205, "0 1"),
      (210, "0 2"),
      (240, "0 3"),
      (280, "1 4"),
      (320, "2 5"),
      (350, "2 6"),
      (370, "2 7"),
      (420, "3 8"),
      (470, "4 9"),
    ]
    .into_iter()
    .map(|(t, v)| ReactiveTest::on_next(t, v.to_string()))
    .chain([ReactiveTest::on_completed(600)])
    .collect();
    assert_eq!(res.messages(), expected);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 600)]);
  }
}
