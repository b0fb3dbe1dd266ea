//! End-to-end scenarios for rxkit.
//!
//! Operator chains driven on virtual time, subjects fed from several
//! threads, and the subscription bookkeeping seen by hot sources.

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread,
};

use parking_lot::Mutex;
use rxkit::{
  prelude::*,
  testing::{ticks, ReactiveTest, TestScheduler},
};

fn is_prime(n: i32) -> bool {
  n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

#[rxkit_macro::test]
fn test_return_disposed_after_next() {
  let scheduler = TestScheduler::new();
  let recorder = scheduler.create_observer::<i32>();
  let handle: Arc<Mutex<Option<Subscription>>> = Arc::default();
  let (observer, h, sched) = (recorder.clone(), handle.clone(), scheduler.as_scheduler());
  scheduler.schedule_at(100, move || {
    let (mut on_next, mut on_complete, slot) = (observer.clone(), observer, h.clone());
    let subscription = observable::of(42).subscribe_with(
      ObserverFns {
        next: move |v: i32| {
          on_next.next(v);
          if let Some(handle) = slot.lock().take() {
            handle.unsubscribe();
          }
        },
        error: |_: RxError| {},
        complete: move || on_complete.complete(),
      },
      Some(sched),
    );
    *h.lock() = Some(subscription);
  });
  scheduler.start_scheduler();
  assert_eq!(recorder.messages(), vec![ReactiveTest::on_next(100, 42)]);
}

#[rxkit_macro::test]
fn test_empty_completes_one_tick_later() {
  let scheduler = TestScheduler::new();
  let res = scheduler.start(observable::empty::<i32>);
  assert_eq!(res.messages(), vec![ReactiveTest::on_completed(201)]);
}

#[rxkit_macro::test]
fn test_map_invocations() {
  let scheduler = TestScheduler::new();
  let xs = scheduler.create_hot_observable(vec![
    ReactiveTest::on_next(180, 1),
    ReactiveTest::on_next(210, 2),
    ReactiveTest::on_next(240, 3),
    ReactiveTest::on_next(290, 4),
    ReactiveTest::on_next(350, 5),
    ReactiveTest::on_completed(400),
    ReactiveTest::on_next(410, -1),
    ReactiveTest::on_completed(420),
    ReactiveTest::on_error(430, "ex"),
  ]);
  let invoked = Arc::new(AtomicUsize::new(0));
  let (src, count) = (xs.as_observable(), invoked.clone());
  let res = scheduler.start(move || {
    src.map(move |x| {
      count.fetch_add(1, Ordering::SeqCst);
      x + 1
    })
  });
  assert_eq!(
    res.messages(),
    vec![
      ReactiveTest::on_next(210, 3),
      ReactiveTest::on_next(240, 4),
      ReactiveTest::on_next(290, 5),
      ReactiveTest::on_next(350, 6),
      ReactiveTest::on_completed(400),
    ]
  );
  assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 400)]);
  assert_eq!(invoked.load(Ordering::SeqCst), 4);
}

#[rxkit_macro::test]
fn test_filter_primes() {
  let scheduler = TestScheduler::new();
  let xs = scheduler.create_hot_observable(vec![
    ReactiveTest::on_next(110, 1),
    ReactiveTest::on_next(180, 2),
    ReactiveTest::on_next(230, 3),
    ReactiveTest::on_next(270, 4),
    ReactiveTest::on_next(340, 5),
    ReactiveTest::on_next(380, 6),
    ReactiveTest::on_next(390, 7),
    ReactiveTest::on_next(450, 8),
    ReactiveTest::on_next(470, 9),
    ReactiveTest::on_next(560, 10),
    ReactiveTest::on_next(580, 11),
    ReactiveTest::on_completed(600),
    ReactiveTest::on_next(610, 12),
    ReactiveTest::on_error(620, "ex"),
    ReactiveTest::on_completed(630),
  ]);
  let invoked = Arc::new(AtomicUsize::new(0));
  let (src, count) = (xs.as_observable(), invoked.clone());
  let res = scheduler.start(move || {
    src.filter(move |x| {
      count.fetch_add(1, Ordering::SeqCst);
      is_prime(*x)
    })
  });
  assert_eq!(
    res.messages(),
    vec![
      ReactiveTest::on_next(230, 3),
      ReactiveTest::on_next(340, 5),
      ReactiveTest::on_next(390, 7),
      ReactiveTest::on_next(580, 11),
      ReactiveTest::on_completed(600),
    ]
  );
  assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 600)]);
  assert_eq!(invoked.load(Ordering::SeqCst), 9);
}

#[rxkit_macro::test]
fn test_take_while_stops_at_first_failure() {
  let scheduler = TestScheduler::new();
  let xs = scheduler.create_hot_observable(vec![
    ReactiveTest::on_next(90, -1),
    ReactiveTest::on_next(110, -1),
    ReactiveTest::on_next(210, 2),
    ReactiveTest::on_next(260, 5),
    ReactiveTest::on_next(290, 13),
    ReactiveTest::on_next(320, 3),
    ReactiveTest::on_next(350, 8),
    ReactiveTest::on_next(390, 4),
    ReactiveTest::on_next(410, 17),
    ReactiveTest::on_completed(600),
  ]);
  let src = xs.as_observable();
  let res = scheduler.start(move || src.take_while(|x| is_prime(*x)));
  assert_eq!(
    res.messages(),
    vec![
      ReactiveTest::on_next(210, 2),
      ReactiveTest::on_next(260, 5),
      ReactiveTest::on_next(290, 13),
      ReactiveTest::on_next(320, 3),
      ReactiveTest::on_completed(350),
    ]
  );
  assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 350)]);
}

#[rxkit_macro::test]
fn test_take_while_source_completes_first() {
  let scheduler = TestScheduler::new();
  let xs = scheduler.create_hot_observable(vec![
    ReactiveTest::on_next(90, -1),
    ReactiveTest::on_next(110, -1),
    ReactiveTest::on_next(210, 2),
    ReactiveTest::on_next(260, 5),
    ReactiveTest::on_next(290, 13),
    ReactiveTest::on_next(320, 3),
    ReactiveTest::on_completed(330),
    ReactiveTest::on_next(350, 7),
    ReactiveTest::on_next(390, 4),
  ]);
  let invoked = Arc::new(AtomicUsize::new(0));
  let (src, count) = (xs.as_observable(), invoked.clone());
  let res = scheduler.start(move || {
    src.take_while(move |x| {
      count.fetch_add(1, Ordering::SeqCst);
      is_prime(*x)
    })
  });
  assert_eq!(
    res.messages(),
    vec![
      ReactiveTest::on_next(210, 2),
      ReactiveTest::on_next(260, 5),
      ReactiveTest::on_next(290, 13),
      ReactiveTest::on_next(320, 3),
      ReactiveTest::on_completed(330),
    ]
  );
  assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 330)]);
  assert_eq!(invoked.load(Ordering::SeqCst), 4);
}

#[rxkit_macro::test]
fn test_buffer_by_boundaries() {
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
  let res = scheduler.start(move || src.buffer(boundaries));
  assert_eq!(
    res.messages(),
    vec![
      ReactiveTest::on_next(255, vec![3]),
      ReactiveTest::on_next(330, vec![4, 5]),
      ReactiveTest::on_next(350, vec![6]),
      ReactiveTest::on_next(400, vec![]),
      ReactiveTest::on_next(500, vec![7, 8, 9]),
      ReactiveTest::on_next(590, vec![10]),
      ReactiveTest::on_completed(590),
    ]
  );
  assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 590)]);
  assert_eq!(ys.subscriptions(), vec![ReactiveTest::subscribe(200, 590)]);
}

#[rxkit_macro::test]
fn test_materialize_round_trip() {
  let scheduler = TestScheduler::new();
  let xs = scheduler.create_hot_observable(vec![
    ReactiveTest::on_next(210, 1),
    ReactiveTest::on_next(220, 2),
    ReactiveTest::on_error(230, "ex"),
  ]);
  let src = xs.as_observable();
  let res = scheduler.start(move || src.materialize().dematerialize());
  assert_eq!(
    res.messages(),
    vec![ReactiveTest::on_next(210, 1), ReactiveTest::on_next(220, 2), ReactiveTest::on_error(230, "ex")]
  );
}

#[rxkit_macro::test]
fn test_replay_delivers_the_last_n_then_live_values() {
  for n in 1..4usize {
    for k in 1..6i32 {
      let subject = Subject::new();
      let replayed = subject.as_observable().replay(Some(n), None);
      let connection = replayed.connect();
      for v in 1..=k {
        subject.try_next(v).unwrap();
      }
      let seen = Arc::new(Mutex::new(vec![]));
      let sink = seen.clone();
      replayed.as_observable().subscribe_next(move |v| sink.lock().push(v));
      subject.try_next(100).unwrap();

      let first = (k - n as i32 + 1).max(1);
      let mut expected: Vec<i32> = (first..=k).collect();
      expected.push(100);
      assert_eq!(*seen.lock(), expected, "n = {n}, k = {k}");
      connection.unsubscribe();
    }
  }
}

#[rxkit_macro::test]
fn test_group_join_overlaps() {
  let scheduler = TestScheduler::new();
  let xs = scheduler.create_hot_observable(vec![
    ReactiveTest::on_next(210, ("a", 30)),
    ReactiveTest::on_next(260, ("b", 10)),
    ReactiveTest::on_completed(300),
  ]);
  let ys = scheduler.create_hot_observable(vec![
    ReactiveTest::on_next(200, (1, 5)),
    ReactiveTest::on_next(220, (2, 50)),
    ReactiveTest::on_next(265, (3, 5)),
    ReactiveTest::on_completed(400),
  ]);
  let (left, right) = (xs.as_observable(), ys.as_observable());
  let res = scheduler.start(move || {
    left
      .group_join(
        right,
        |x| observable::timer(ticks(x.1), None),
        |y| observable::timer(ticks(y.1), None),
        |x, window| window.map(move |y| format!("{}{}", x.0, y.0)).to_list(),
      )
      .merge_all()
  });
  assert_eq!(
    res.messages(),
    vec![
      ReactiveTest::on_next(240, vec!["a2".to_string()]),
      ReactiveTest::on_next(270, vec!["b2".to_string(), "b3".to_string()]),
      ReactiveTest::on_completed(300),
    ]
  );
}

#[rxkit_macro::test]
fn test_zip_with_hot_and_cold_sources() {
  let scheduler = TestScheduler::new();
  let xs = scheduler.create_hot_observable(vec![
    ReactiveTest::on_next(210, 1),
    ReactiveTest::on_next(220, 2),
    ReactiveTest::on_next(230, 3),
    ReactiveTest::on_completed(240),
  ]);
  let s = scheduler.clone();
  let src = xs.as_observable();
  let res = scheduler.start(move || {
    let ys = s.create_cold_observable(vec![
      ReactiveTest::on_next(50, "x"),
      ReactiveTest::on_next(60, "y"),
      ReactiveTest::on_completed(70),
    ]);
    src.zip_with(ys.as_observable())
  });
  assert_eq!(
    res.messages(),
    vec![ReactiveTest::on_next(250, (1, "x")), ReactiveTest::on_next(260, (2, "y")), ReactiveTest::on_completed(270)]
  );
}

#[rxkit_macro::test]
fn test_subject_fed_from_many_threads() {
  let subject = Subject::new();
  let total = Arc::new(AtomicUsize::new(0));
  let sink = total.clone();
  subject.as_observable().scan(|acc: usize, v: usize| acc + v).subscribe_next(move |v| {
    sink.store(v, Ordering::SeqCst);
  });
  let handles: Vec<_> = (0..4)
    .map(|_| {
      let subject = subject.clone();
      thread::spawn(move || {
        for v in 1..=100 {
          subject.try_next(v).unwrap();
        }
      })
    })
    .collect();
  for handle in handles {
    handle.join().unwrap();
  }
  assert_eq!(total.load(Ordering::SeqCst), 4 * 5050);
}

#[rxkit_macro::test]
fn test_retry_then_catch() {
  let scheduler = TestScheduler::new();
  let s = scheduler.clone();
  let res = scheduler.start(move || {
    let xs = s.create_cold_observable(vec![ReactiveTest::on_next(10, 1), ReactiveTest::on_error(20, "ex")]);
    xs.as_observable().retry(Some(2)).catch_with(|_| observable::of(-1))
  });
  assert_eq!(
    res.messages(),
    vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(230, 1),
      ReactiveTest::on_next(240, -1),
      ReactiveTest::on_completed(240),
    ]
  );
}
