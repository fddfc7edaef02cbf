// rill_core/examples/error_recovery.rs

use rill::{Consumer, Many, RillError, Single};
use tracing::{info, warn};

fn checked_div(numerator: i32, denominator: i32) -> anyhow::Result<i32> {
  if denominator == 0 {
    anyhow::bail!("division by zero");
  }
  Ok(numerator / denominator)
}

#[tokio::main]
async fn main() -> Result<(), RillError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Error Containment and Recovery Example ---");

  // A failing transform never raises at construction time. The chain below
  // builds fine; the failure only exists once a consumer subscribes.
  let failing = Single::just(10).try_map(|value| checked_div(value, 0));

  // 1. Handled: the consumer's on_error callback receives the failure.
  let consumer = Consumer::new()
    .on_next(|value: i32| info!("  value: {value}"))
    .on_error(|error| warn!("  handled error: {error}"));
  let state = failing.subscribe_with(consumer).await?;
  info!("Handled subscription ended in state: {state:?}");

  // 2. Unhandled: with no on_error callback, subscribe returns the failure.
  match failing.subscribe(|value| info!("  value: {value}")).await {
    Ok(state) => info!("Unexpected success: {state:?}"),
    Err(error) => warn!("Unhandled error returned to caller: {error}"),
  }

  // 3. Recovered: on_error_return swallows the failure and substitutes a
  //    fallback, completing normally.
  let recovered = failing.on_error_return(-1);
  recovered.subscribe(|value| info!("  recovered value: {value}")).await?;

  // 4. Multi-value streams keep everything delivered before the failure.
  let partial = Many::range(1, 5)
    .try_map(|value| {
      if value < 4 {
        Ok(value)
      } else {
        Err(anyhow::anyhow!("Got to 4"))
      }
    })
    .on_error_return(-1);
  partial.subscribe(|value| info!("  stream value: {value}")).await?;

  Ok(())
}
