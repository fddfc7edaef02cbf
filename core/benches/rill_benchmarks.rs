use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rill::{Many, Single};
use tokio::runtime::Runtime; // To run async code within Criterion

// --- Benchmark Functions ---

fn bench_many_map_chain(c: &mut Criterion) {
  let mut group = c.benchmark_group("ManyMapChain");
  let rt = Runtime::new().unwrap();

  for stream_len in [10u32, 100, 1000].iter() {
    group.throughput(Throughput::Elements(*stream_len as u64));
    group.bench_with_input(BenchmarkId::from_parameter(stream_len), stream_len, |b, &stream_len| {
      let pipeline = Many::range(0, stream_len)
        .map(|value| value.wrapping_mul(3))
        .filter(|value| value % 2 == 0)
        .map(|value| value.wrapping_add(1));
      b.to_async(&rt).iter(|| {
        let pipeline = pipeline.clone();
        async move { pipeline.subscribe(|_value| {}).await.unwrap() }
      });
    });
  }
  group.finish();
}

fn bench_single_flat_map_depth(c: &mut Criterion) {
  let mut group = c.benchmark_group("SingleFlatMapDepth");
  let rt = Runtime::new().unwrap();

  for depth in [1usize, 4, 16].iter() {
    group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
      let mut pipeline = Single::just(0u64);
      for _ in 0..depth {
        pipeline = pipeline.flat_map(|value| Single::just(value + 1));
      }
      b.to_async(&rt).iter(|| {
        let pipeline = pipeline.clone();
        async move { pipeline.subscribe(|_value| {}).await.unwrap() }
      });
    });
  }
  group.finish();
}

fn bench_generate_sequence(c: &mut Criterion) {
  let mut group = c.benchmark_group("GenerateSequence");
  let rt = Runtime::new().unwrap();

  for stream_len in [100u64, 1000].iter() {
    group.throughput(Throughput::Elements(*stream_len));
    group.bench_with_input(BenchmarkId::from_parameter(stream_len), stream_len, |b, &stream_len| {
      let pipeline = Many::generate(
        || 0u64,
        move |state, emitter| {
          emitter.next(state);
          if state + 1 == stream_len {
            emitter.complete();
          }
          state + 1
        },
      );
      b.to_async(&rt).iter(|| {
        let pipeline = pipeline.clone();
        async move { pipeline.subscribe(|_value| {}).await.unwrap() }
      });
    });
  }
  group.finish();
}

fn bench_sink_replay(c: &mut Criterion) {
  let mut group = c.benchmark_group("SinkReplay");
  let rt = Runtime::new().unwrap();

  for buffered in [100u32, 1000].iter() {
    group.throughput(Throughput::Elements(*buffered as u64));
    group.bench_with_input(BenchmarkId::from_parameter(buffered), buffered, |b, &buffered| {
      b.to_async(&rt).iter(|| async move {
        let (sink, pipeline) = Many::<u32>::emitter();
        for value in 0..buffered {
          sink.emit(value).unwrap();
        }
        sink.complete().unwrap();
        pipeline.subscribe(|_value| {}).await.unwrap()
      });
    });
  }
  group.finish();
}

criterion_group!(
  benches,
  bench_many_map_chain,
  bench_single_flat_map_depth,
  bench_generate_sequence,
  bench_sink_replay
);
criterion_main!(benches);
