use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise logging. `debug` lowers the level to `debug` and lets
/// `RUST_LOG` override it; otherwise the level is pinned to `info`.
///
/// When `log_file` is given, output is also appended to that file. Calling
/// this more than once keeps the first subscriber.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let file_layer = log_file.and_then(|path| {
        let dir = path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        let name = path.file_name()?.to_owned();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("could not create log folder {}: {e}", dir.display());
            return None;
        }
        let appender = tracing_appender::rolling::never(dir, name);
        Some(fmt::layer().with_writer(appender).with_ansi(false))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();
}
