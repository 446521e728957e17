use criterion::BenchmarkGroup;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use std::hint::black_box;
use std::sync::Arc as StdArc;
use std::sync::Barrier;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;
use triomphe::Arc;
use tuplex::core::EntryRecord;
use tuplex::core::Ordinal;
use tuplex::core::Timestamp;
use tuplex::core::TypeName;
use tuplex::space::EntryTransition;
use tuplex::space::Space;
use tuplex::space::SpaceConfig;
use tuplex::space::TransitionWatcher;

const THREADS: &[usize] = &[2, 4, 8];
const TEMPLATES: &[usize] = &[1, 16, 256];

struct Sink;

impl TransitionWatcher for Sink {
  fn expiration(&self) -> Timestamp {
    Timestamp::FOREVER
  }

  fn is_interested(&self, transition: &EntryTransition, _: Ordinal) -> bool {
    transition.is_available()
  }
}

fn space() -> Space {
  let mut config: SpaceConfig = SpaceConfig::new();
  config.shuffle_seed = Some(0);
  Space::new(config)
}

fn dog(name: u64) -> Arc<EntryRecord> {
  let record: EntryRecord = EntryRecord::builder(TypeName::new("bench::Dog"))
    .extends(TypeName::new("bench::Animal"))
    .field(name as i64)
    .field("brown")
    .entry()
    .unwrap();

  Arc::new(record)
}

fn bench_write(criterion: &mut Criterion) {
  let mut group: BenchmarkGroup<_> = criterion.benchmark_group("write");

  for templates in TEMPLATES {
    let id: BenchmarkId = BenchmarkId::new("watched", templates);

    group.bench_with_input(id, templates, |bench, &templates| {
      let space: Space = space();

      for name in 0..templates as u64 {
        let template: EntryRecord = EntryRecord::builder(TypeName::new("bench::Animal"))
          .field(name as i64)
          .template()
          .unwrap();

        space.register(StdArc::new(Sink), Arc::new(template));
      }

      let mut name: u64 = 0;

      bench.iter(|| {
        name = (name + 1) % templates as u64;
        black_box(space.write(dog(name), Timestamp::FOREVER));
      })
    });
  }

  group.finish();
}

fn bench_write_take(criterion: &mut Criterion) {
  let mut group: BenchmarkGroup<_> = criterion.benchmark_group("write_take");
  let template: EntryRecord = EntryRecord::any_of(TypeName::new("bench::Animal"));

  group.bench_function("single-threaded", |bench| {
    let space: Space = space();

    bench.iter(|| {
      space.write(dog(1), Timestamp::FOREVER);
      black_box(space.take(&template, Timestamp::EPOCH));
    })
  });

  for threads in THREADS {
    let id: BenchmarkId = BenchmarkId::new("multi-threaded", threads);

    group.bench_with_input(id, threads, |bench, &threads| {
      bench.iter_custom(|iters| {
        let space: StdArc<Space> = StdArc::new(space());
        let barrier: StdArc<Barrier> = StdArc::new(Barrier::new(threads + 1));
        let mut handles: Vec<JoinHandle<Duration>> = Vec::with_capacity(threads);

        for _ in 0..threads {
          let space: StdArc<Space> = StdArc::clone(&space);
          let barrier: StdArc<Barrier> = StdArc::clone(&barrier);

          let handle: JoinHandle<Duration> = thread::spawn(move || {
            let template: EntryRecord = EntryRecord::any_of(TypeName::new("bench::Animal"));

            barrier.wait();

            let start: Instant = Instant::now();

            for name in 0..iters {
              space.write(dog(name), Timestamp::FOREVER);
              black_box(space.take(&template, Timestamp::EPOCH));
            }

            start.elapsed()
          });

          handles.push(handle);
        }

        barrier.wait();

        handles
          .into_iter()
          .map(|handle| handle.join().unwrap())
          .sum()
      })
    });
  }

  group.finish();
}

criterion_group! {
  name = benches;
  config = Criterion::default();
  targets = bench_write, bench_write_take
}

criterion_main!(benches);
