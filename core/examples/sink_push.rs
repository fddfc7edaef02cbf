// rill_core/examples/sink_push.rs

use rill::{Many, RillError};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), RillError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Emitter Sink Example ---");

  let (sink, pipeline) = Many::<u32>::emitter();

  // Values pushed before anyone subscribes are buffered and replayed.
  sink.emit(1)?;
  sink.emit(2)?;
  info!("Buffered two values before subscribing.");

  // The consumer runs in its own task; it replays the buffer, then waits
  // for the producer.
  let consumer = tokio::spawn(async move {
    pipeline
      .map(|value| value * 100)
      .subscribe(|value| info!("  received: {value}"))
      .await
  });

  // Producer side: push a few more values, then complete.
  for value in 3..=5 {
    tokio::time::sleep(Duration::from_millis(50)).await;
    sink.emit(value)?;
  }
  sink.complete()?;

  let state = consumer.await.map_err(|e| RillError::Internal(e.to_string()))??;
  info!("Consumer finished in state: {state:?}");

  // The sink refuses further emissions after its terminal signal.
  match sink.emit(99) {
    Err(error) => info!("Late emission rejected: {error}"),
    Ok(()) => info!("Unexpectedly accepted a late emission"),
  }

  Ok(())
}
