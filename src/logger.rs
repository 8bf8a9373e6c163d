use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;

/// Installs the global log subscriber. Logs go to stderr so stdout stays for results.
pub fn init(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(cfg!(debug_assertions))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
