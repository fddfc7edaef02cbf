// rill_core/examples/generate_sequence.rs

use rill::{Many, RillError};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), RillError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Stateful Generation Example ---");

  // A multiplication table, produced by threading an integer state through
  // the step function. Each step emits at most one value; the finalizer
  // receives the final state exactly once when the sequence terminates.
  let table = Many::generate_with(
    || 1,
    |i: i32, emitter| {
      emitter.next(format!("3 x {i} = {}", 3 * i));
      if i == 10 {
        emitter.complete();
      }
      i + 1
    },
    |final_state| info!("generator finished with state {final_state}"),
  );

  table.subscribe(|line| info!("{line}")).await?;

  // The same chain can be consumed again; state starts over from init.
  info!("Re-subscribing, the state is rebuilt from scratch:");
  let state = table.map(|line| line.to_uppercase()).subscribe(|line| info!("{line}")).await?;
  info!("Second run ended in state: {state:?}");

  Ok(())
}
