// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::Level;

// --- Common Fixture Structs ---
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cat {
  pub name: String,
  pub age: u32,
}

impl Cat {
  pub fn new(name: &str, age: u32) -> Self {
    Self {
      name: name.to_string(),
      age,
    }
  }
}

pub fn barsik() -> Cat {
  Cat::new("Barsik", 3)
}

pub fn vasia() -> Cat {
  Cat::new("Vasia", 5)
}

pub fn shelter() -> Vec<Cat> {
  vec![barsik(), vasia()]
}

// --- Signal Recording Helpers ---
pub type Shared<T> = Arc<Mutex<Vec<T>>>;

pub fn recorder<T>() -> Shared<T> {
  Arc::new(Mutex::new(Vec::new()))
}

/// An `on_next` callback pushing every delivered value into the recorder.
pub fn push_into<T: Send + 'static>(recorded: &Shared<T>) -> impl FnMut(T) + Send + 'static {
  let recorded = Arc::clone(recorded);
  move |value| recorded.lock().push(value)
}

// --- Common Fallible Transforms ---
pub fn checked_div(numerator: i32, denominator: i32) -> anyhow::Result<i32> {
  if denominator == 0 {
    anyhow::bail!("division by zero");
  }
  Ok(numerator / denominator)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
