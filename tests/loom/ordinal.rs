#![cfg(loom)]

use loom::sync::Arc;
use loom::thread;
use tuplex::core::Ordinal;
use tuplex::core::OrdinalClock;

#[test]
fn first_tick_is_first() {
  loom::model(|| {
    let clock: OrdinalClock = OrdinalClock::new();

    assert_eq!(clock.last(), None);
    assert_eq!(clock.tick(), Ordinal::FIRST);
    assert_eq!(clock.last(), Some(Ordinal::FIRST));
  });
}

#[test]
fn concurrent_ticks_are_distinct() {
  loom::model(|| {
    let clock: Arc<OrdinalClock> = Arc::new(OrdinalClock::new());

    let threads: Vec<_> = (0..2)
      .map(|_| {
        let clock: Arc<OrdinalClock> = Arc::clone(&clock);

        thread::spawn(move || {
          let first: Ordinal = clock.tick();
          let second: Ordinal = clock.tick();

          assert!(first < second, "ticks went backwards on one thread");

          [first, second]
        })
      })
      .collect();

    let mut all: Vec<Ordinal> = Vec::new();

    for handle in threads {
      all.extend(handle.join().unwrap());
    }

    all.sort_unstable();
    all.dedup();

    assert_eq!(all.len(), 4, "two threads saw the same ordinal");
    assert_eq!(clock.last().map(Ordinal::get), Some(4));
  });
}
