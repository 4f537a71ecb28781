use std::io;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes tracing. Logs go to stderr so stdout only carries the encoded output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        );

    if let Err(e) = subscriber.try_init() {
        eprintln!("Failed to initialize tracing subscriber: {}", e);
    }
}
