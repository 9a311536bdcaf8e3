use error_stack::{Report, ResultExt};
use log::LevelFilter;

use crate::error::LitePubError;

/// Initialize logging for the application.
/// Should be called once at the start of main().
///
/// # Errors
///
/// Returns [`LitePubError::Configuration`] if a global logger is already set.
pub fn init_logging(level: LevelFilter) -> Result<(), Report<LitePubError>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // Dependencies are noisy at debug level.
        .level_for("ureq", LevelFilter::Warn)
        .level_for("ureq_proto", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()
        .change_context(LitePubError::Configuration {
            message: "Failed to initialize logger".into(),
        })
}

