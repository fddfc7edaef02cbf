// tests/many_pipeline_tests.rs
mod common; // Reference the common module

use common::*;
use rill::{Consumer, Many, SubscriptionHandle, SubscriptionState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_from_values_delivers_in_order() {
  setup_tracing();
  let names = recorder();

  let pipeline = Many::from_values(shelter()).map(|cat| cat.name);
  let state = pipeline.subscribe(push_into(&names)).await.unwrap();

  assert_eq!(state, SubscriptionState::Completed);
  assert_eq!(*names.lock(), vec!["Barsik".to_string(), "Vasia".to_string()]);
}

#[tokio::test]
async fn test_range_emits_consecutive_integers() {
  setup_tracing();
  let values = recorder();

  Many::range(1, 4).subscribe(push_into(&values)).await.unwrap();

  assert_eq!(*values.lock(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_cold_chain_reruns_on_each_subscription() {
  setup_tracing();
  let values = recorder();

  let pipeline = Many::range(1, 3);
  pipeline.subscribe(push_into(&values)).await.unwrap();
  pipeline.subscribe(push_into(&values)).await.unwrap();

  assert_eq!(*values.lock(), vec![1, 2, 3, 1, 2, 3]);
}

#[tokio::test]
async fn test_defer_factory_runs_once_per_subscription() {
  setup_tracing();
  let factory_calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&factory_calls);

  let pipeline = Many::defer(move || {
    counter.fetch_add(1, Ordering::SeqCst);
    Many::range(0, 2)
  });
  assert_eq!(factory_calls.load(Ordering::SeqCst), 0, "factory must not run at construction");

  pipeline.subscribe(|_| {}).await.unwrap();
  pipeline.subscribe(|_| {}).await.unwrap();
  assert_eq!(factory_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_filter_forwards_only_accepted_values() {
  setup_tracing();
  let values = recorder();

  Many::range(1, 6)
    .filter(|value| value % 2 == 0)
    .subscribe(push_into(&values))
    .await
    .unwrap();

  assert_eq!(*values.lock(), vec![2, 4, 6]);
}

#[tokio::test]
async fn test_flat_map_flattens_sequentially() {
  setup_tracing();
  let values = recorder();

  Many::from_values(vec![10, 20])
    .flat_map(|value| Many::from_values(vec![value, value + 1]))
    .subscribe(push_into(&values))
    .await
    .unwrap();

  // Inner pipelines run to completion in outer order.
  assert_eq!(*values.lock(), vec![10, 11, 20, 21]);
}

#[tokio::test]
async fn test_do_on_next_observes_every_value() {
  setup_tracing();
  let observed = recorder();
  let delivered = recorder();
  let observer = Arc::clone(&observed);

  Many::from_values(shelter())
    .do_on_next(move |cat| observer.lock().push(cat.age))
    .map(|cat| cat.name)
    .subscribe(push_into(&delivered))
    .await
    .unwrap();

  assert_eq!(*observed.lock(), vec![3, 5]);
  assert_eq!(*delivered.lock(), vec!["Barsik".to_string(), "Vasia".to_string()]);
}

#[tokio::test]
async fn test_generate_threads_state_to_completion() {
  setup_tracing();
  let values = recorder();

  let pipeline = Many::generate(
    || 0,
    |state: i32, emitter| {
      emitter.next(state);
      if state == 10 {
        emitter.complete();
      }
      state + 1
    },
  );
  let state = pipeline.subscribe(push_into(&values)).await.unwrap();

  assert_eq!(state, SubscriptionState::Completed);
  assert_eq!(*values.lock(), (0..=10).collect::<Vec<i32>>());
}

#[tokio::test]
async fn test_generate_with_finalizer_receives_final_state() {
  setup_tracing();
  let final_states = recorder();
  let finalizer_states = Arc::clone(&final_states);

  Many::generate_with(
    || 0,
    |state: i32, emitter| {
      emitter.next(state * 3);
      if state == 5 {
        emitter.complete();
      }
      state + 1
    },
    move |state| finalizer_states.lock().push(state),
  )
  .subscribe(|_| {})
  .await
  .unwrap();

  // One invocation, with the state returned by the final step.
  assert_eq!(*final_states.lock(), vec![6]);
}

#[tokio::test]
async fn test_generate_finalizer_runs_on_cancellation() {
  setup_tracing();
  let finalized = Arc::new(AtomicUsize::new(0));
  let finalizer_calls = Arc::clone(&finalized);
  let handle = SubscriptionHandle::new();

  let pipeline = Many::generate_with(
    || 0u64,
    |state, emitter| {
      emitter.next(state);
      state + 1
    },
    move |_state| {
      finalizer_calls.fetch_add(1, Ordering::SeqCst);
    },
  );

  // Cancel from within the consumer after the third value.
  let canceller = handle.clone();
  let seen = Arc::new(AtomicUsize::new(0));
  let seen_counter = Arc::clone(&seen);
  let consumer = Consumer::new().on_next(move |_value: u64| {
    if seen_counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
      canceller.cancel();
    }
  });

  let state = pipeline.subscribe_with_handle(&handle, consumer).await.unwrap();

  assert_eq!(state, SubscriptionState::Cancelled);
  assert_eq!(seen.load(Ordering::SeqCst), 3);
  assert_eq!(finalized.load(Ordering::SeqCst), 1, "finalizer must run exactly once");
}

#[tokio::test]
async fn test_generate_misuse_terminates_with_error_and_finalizes() {
  setup_tracing();
  let finalized = Arc::new(AtomicUsize::new(0));
  let finalizer_calls = Arc::clone(&finalized);
  let errors = recorder();
  let error_sink = Arc::clone(&errors);

  let pipeline = Many::generate_with(
    || 0,
    |state: i32, emitter| {
      emitter.next(state);
      emitter.next(state); // Second emission per step violates the contract
      state + 1
    },
    move |_state| {
      finalizer_calls.fetch_add(1, Ordering::SeqCst);
    },
  );

  let consumer = Consumer::new()
    .on_next(|_value: i32| {})
    .on_error(move |error| error_sink.lock().push(error));
  let state = pipeline.subscribe_with(consumer).await.unwrap();

  assert_eq!(state, SubscriptionState::Errored);
  assert_eq!(finalized.load(Ordering::SeqCst), 1);
  let guard = errors.lock();
  assert_eq!(guard.len(), 1);
  assert!(matches!(guard[0], rill::RillError::GeneratorMisuse { .. }));
}

#[tokio::test]
async fn test_consumer_cancel_stops_value_delivery() {
  setup_tracing();
  let values = recorder();
  let handle = SubscriptionHandle::new();

  let canceller = handle.clone();
  let delivered = Arc::clone(&values);
  let consumer = Consumer::new().on_next(move |value: i32| {
    delivered.lock().push(value);
    if value == 2 {
      canceller.cancel();
    }
  });

  let state = Many::range(1, 100).subscribe_with_handle(&handle, consumer).await.unwrap();

  assert_eq!(state, SubscriptionState::Cancelled);
  assert_eq!(*values.lock(), vec![1, 2]);
}
