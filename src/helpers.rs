use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::classifier::Classification;

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be set when called twice from the same process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn format_elapsed(elapsed: Duration) -> String {
    format!("time: {}s", elapsed.as_secs_f64())
}

/// `0.874510: golden retriever`; the class index stands in for a missing label.
pub fn format_classification(c: &Classification) -> String {
    match &c.label {
        Some(label) => format!("{:08.6}: {}", c.confidence, label),
        None => format!("{:08.6}: {}", c.confidence, c.class),
    }
}
