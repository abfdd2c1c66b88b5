use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub fn init_tracing() {
    // Check if file logging is enabled via environment variable
    let file_logging = std::env::var("TRENDWATCH_LOG_FILE").ok();

    // Stdout is reserved for command output (e.g. `settings show`)
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let registry = tracing_subscriber::registry().with(console);

    let Some(log_path) = file_logging else {
        registry.init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);

            registry.with(file_layer).init();
            eprintln!("File logging enabled: {}", log_path);
        }
        Err(e) => {
            registry.init();
            eprintln!("Failed to open log file {}: {}", log_path, e);
        }
    }
}
