use serde_json::{json, Value};

/// `n` records shaped `{"id": i, "name": "Item i"}`, ids starting at 1.
pub fn sample_items(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| json!({ "id": i, "name": format!("Item {i}") }))
        .collect()
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
/// Honors `RUST_LOG`, defaulting to `debug` for querykit crates.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("querykit_core=debug,querykit_test=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
