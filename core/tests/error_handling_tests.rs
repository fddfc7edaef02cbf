// tests/error_handling_tests.rs
mod common; // Reference the common module

use common::*;
use rill::{Consumer, Many, RillError, Single, SubscriptionHandle, SubscriptionState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_try_map_failure_becomes_terminal_error() {
  setup_tracing();
  let values: Shared<i32> = recorder();
  let errors = recorder();
  let error_sink = Arc::clone(&errors);

  let pipeline = Single::just(7).map(|value| value + 3).try_map(|value| checked_div(value, 0));
  let consumer = Consumer::new()
    .on_next(push_into(&values))
    .on_error(move |error| error_sink.lock().push(error));
  let state = pipeline.subscribe_with(consumer).await.unwrap();

  assert_eq!(state, SubscriptionState::Errored);
  assert!(values.lock().is_empty(), "no value may follow a failed transform");
  let guard = errors.lock();
  assert_eq!(guard.len(), 1);
  match &guard[0] {
    RillError::Transform { operator, .. } => assert_eq!(*operator, "try_map"),
    other => panic!("Expected RillError::Transform, got {:?}", other),
  }
  assert_eq!(guard[0].user_message().as_deref(), Some("division by zero"));
}

#[tokio::test]
async fn test_chain_construction_never_raises() {
  setup_tracing();
  // Installing a failing operator is not an error; only subscribing is.
  let pipeline = Single::just(1).try_map(|_value| Err::<i32, _>(anyhow::anyhow!("Mono failed")));
  let _second = pipeline.map(|value| value * 2);

  let result = pipeline.subscribe(|_| {}).await;
  assert!(matches!(result, Err(RillError::Transform { .. })));
}

#[tokio::test]
async fn test_on_error_return_substitutes_fallback() {
  setup_tracing();
  let values = recorder();

  let pipeline = Single::just("Barsik".to_string())
    .map(|name| format!("{name}Test"))
    .try_map(|name| {
      if name == "BarsikTest" {
        Err(anyhow::anyhow!("Mono failed"))
      } else {
        Ok(name)
      }
    })
    .on_error_return("BarsikAfterError".to_string());
  let state = pipeline.subscribe(push_into(&values)).await.unwrap();

  assert_eq!(state, SubscriptionState::Completed);
  assert_eq!(*values.lock(), vec!["BarsikAfterError".to_string()]);
}

#[tokio::test]
async fn test_unhandled_error_returned_from_subscribe() {
  setup_tracing();
  let pipeline = Single::just(5).try_map(|value| checked_div(value, 0));

  let result = pipeline.subscribe(|_| {}).await;

  match result {
    Err(error) => assert_eq!(error.user_message().as_deref(), Some("division by zero")),
    Ok(state) => panic!("Expected unhandled error, got {:?}", state),
  }
}

#[tokio::test]
async fn test_try_from_action_error_surfaces_at_subscribe() {
  setup_tracing();
  let attempts = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&attempts);

  // Construction must not run the action.
  let pipeline = Single::try_from_action(move || {
    counter.fetch_add(1, Ordering::SeqCst);
    anyhow::bail!("side effect refused")
  });
  assert_eq!(attempts.load(Ordering::SeqCst), 0);

  let errors = recorder();
  let error_sink = Arc::clone(&errors);
  let consumer = Consumer::new().on_error(move |error| error_sink.lock().push(error));
  let state = pipeline.subscribe_with(consumer).await.unwrap();

  assert_eq!(state, SubscriptionState::Errored);
  assert_eq!(attempts.load(Ordering::SeqCst), 1);
  assert_eq!(errors.lock()[0].user_message().as_deref(), Some("side effect refused"));
}

#[tokio::test]
async fn test_many_error_preserves_already_delivered_values() {
  setup_tracing();
  let values = recorder();
  let errors = recorder();
  let error_sink = Arc::clone(&errors);

  let pipeline = Many::range(1, 5).try_map(|value| {
    if value < 4 {
      Ok(value)
    } else {
      Err(anyhow::anyhow!("Got to 4"))
    }
  });
  let consumer = Consumer::new()
    .on_next(push_into(&values))
    .on_error(move |error| error_sink.lock().push(error));
  let state = pipeline.subscribe_with(consumer).await.unwrap();

  assert_eq!(state, SubscriptionState::Errored);
  assert_eq!(*values.lock(), vec![1, 2, 3]);
  assert_eq!(errors.lock()[0].user_message().as_deref(), Some("Got to 4"));
}

#[tokio::test]
async fn test_many_on_error_return_emits_fallback_then_completes() {
  setup_tracing();
  let values = recorder();
  let completions = Arc::new(AtomicUsize::new(0));
  let completed = Arc::clone(&completions);

  let pipeline = Many::range(1, 5)
    .try_map(|value| {
      if value < 4 {
        Ok(value)
      } else {
        Err(anyhow::anyhow!("Got to 4"))
      }
    })
    .on_error_return(-1);
  let consumer = Consumer::new().on_next(push_into(&values)).on_complete(move || {
    completed.fetch_add(1, Ordering::SeqCst);
  });
  let state = pipeline.subscribe_with(consumer).await.unwrap();

  assert_eq!(state, SubscriptionState::Completed);
  assert_eq!(*values.lock(), vec![1, 2, 3, -1]);
  assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_generator_error_signal_terminates_after_emission() {
  setup_tracing();
  let values = recorder();
  let errors = recorder();
  let error_sink = Arc::clone(&errors);

  let pipeline = Many::generate(
    || 1,
    |state: i32, emitter| {
      emitter.next(state);
      if state == 3 {
        emitter.error(anyhow::anyhow!("state exhausted"));
      }
      state + 1
    },
  );
  let consumer = Consumer::new()
    .on_next(push_into(&values))
    .on_error(move |error| error_sink.lock().push(error));
  let state = pipeline.subscribe_with(consumer).await.unwrap();

  assert_eq!(state, SubscriptionState::Errored);
  // The value emitted in the failing step is still delivered first.
  assert_eq!(*values.lock(), vec![1, 2, 3]);
  assert_eq!(errors.lock()[0].user_message().as_deref(), Some("state exhausted"));
}

#[tokio::test]
async fn test_subscription_handle_cannot_be_reused() {
  setup_tracing();
  let handle = SubscriptionHandle::new();
  let pipeline = Single::just(1);

  let first = pipeline.subscribe_with_handle(&handle, Consumer::new()).await;
  assert_eq!(first.unwrap(), SubscriptionState::Completed);

  let second = pipeline.subscribe_with_handle(&handle, Consumer::new()).await;
  match second {
    Err(RillError::SubscriptionMisuse { state }) => assert_eq!(state, SubscriptionState::Completed),
    other => panic!("Expected SubscriptionMisuse, got {:?}", other),
  }
}

#[tokio::test]
async fn test_on_error_return_skips_fallback_after_cancellation() {
  setup_tracing();
  let observed: Shared<i32> = recorder();
  let observer = Arc::clone(&observed);
  let handle = SubscriptionHandle::new();
  let canceller = handle.clone();

  let pipeline = Single::just(1)
    .do_on_next(move |_value| canceller.cancel())
    .try_map(|_value| Err::<i32, _>(anyhow::anyhow!("late failure")))
    .on_error_return(9)
    .do_on_next(move |value| observer.lock().push(*value));

  let state = pipeline.subscribe_with_handle(&handle, Consumer::new()).await.unwrap();

  assert_eq!(state, SubscriptionState::Cancelled);
  assert!(observed.lock().is_empty(), "no operator may run after cancellation");
}

#[tokio::test]
async fn test_cancelled_subscription_suppresses_error_delivery() {
  setup_tracing();
  let errors: Shared<RillError> = recorder();
  let error_sink = Arc::clone(&errors);

  // A cancellation raised mid-stream wins over any later error outcome.
  let handle = SubscriptionHandle::new();
  let canceller = handle.clone();
  let pipeline = Many::range(1, 5)
    .do_on_next(move |value| {
      if *value == 2 {
        canceller.cancel();
      }
    })
    .try_map(|value| if value < 3 { Ok(value) } else { Err(anyhow::anyhow!("late failure")) });

  let consumer = Consumer::new()
    .on_next(|_value: i32| {})
    .on_error(move |error| error_sink.lock().push(error));
  let state = pipeline.subscribe_with_handle(&handle, consumer).await.unwrap();

  assert_eq!(state, SubscriptionState::Cancelled);
  assert!(errors.lock().is_empty(), "no error may surface after cancellation");
}
