use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the global logger once. `RUST_LOG` wins over `verbosity`.
/// Output goes to stderr so CLI output stays clean.
pub fn init_logging(verbosity: u8) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(level_for(verbosity));
        }
        builder.format_timestamp_millis();
        let _ = builder.try_init();
        log::debug!("logging initialized");
    });
}

fn level_for(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}
