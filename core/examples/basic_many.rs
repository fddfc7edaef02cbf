// rill_core/examples/basic_many.rs

use rill::{Many, RillError};
use tracing::info;

// 1. Define a value type for the pipeline
#[derive(Clone, Debug)]
struct Cat {
  name: String,
  age: u32,
}

#[tokio::main]
async fn main() -> Result<(), RillError> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Many Pipeline Example ---");

  // 2. Declare a cold pipeline. Nothing runs yet.
  let cats = Many::from_values(vec![
    Cat {
      name: "Barsik".to_string(),
      age: 3,
    },
    Cat {
      name: "Vasia".to_string(),
      age: 5,
    },
    Cat {
      name: "Murka".to_string(),
      age: 1,
    },
  ]);

  let adult_names = cats.filter(|cat| cat.age >= 3).map(|cat| cat.name);

  // 3. Subscribe. The chain runs now, delivering values in order.
  info!("First subscription:");
  adult_names.subscribe(|name| info!("  adult cat: {name}")).await?;

  // 4. Subscribing again re-runs the whole chain (cold semantics).
  info!("Second subscription (same chain, fresh run):");
  let state = adult_names.subscribe(|name| info!("  adult cat again: {name}")).await?;

  info!("Subscription finished in state: {state:?}");
  Ok(())
}
