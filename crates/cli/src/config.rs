//! Configuration loading.
//!
//! Settings come from the embedded `litepub.toml` unless `--config` names a
//! file. Either way, environment variables prefixed with `LITEPUB__` override
//! individual values, e.g. `LITEPUB__HTTP__TIMEOUT_SECS=30`.

use std::fs;
use std::path::{Path, PathBuf};

use litepub_common::settings::Settings;
use validator::Validate;

use crate::error::CliError;

/// Load settings from `file`, or the embedded defaults when `None`.
pub(crate) fn load_settings(file: Option<&Path>) -> Result<Settings, CliError> {
    let settings = match file {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            let content = fs::read_to_string(path)?;
            Settings::from_toml(&content)?
        }
        None => Settings::new()?,
    };

    settings
        .validate()
        .map_err(|e| CliError::Config(format!("Settings validation failed: {e}")))?;

    Ok(settings)
}

/// Validate a configuration file and print a summary.
pub fn validate(file: PathBuf) -> Result<(), CliError> {
    let settings = load_settings(Some(&file))?;

    println!("Configuration is valid");
    println!("  File: {}", file.display());
    println!("  Timeout: {}s", settings.http.timeout_secs);
    println!("  User-Agent: {}", settings.http.user_agent);
    match &settings.signing {
        Some(signing) => println!("  Signing as: {}", signing.key_id),
        None => println!("  Signing: not configured"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
        file.write_all(content.as_bytes())
            .expect("should write config");
        file
    }

    #[test]
    fn test_load_settings_from_file() {
        let file = write_config(
            r#"
            [http]
            timeout_secs = 7
            user_agent = "lpcli-test"
            "#,
        );

        let settings = load_settings(Some(file.path())).expect("should load");
        assert_eq!(settings.http.timeout_secs, 7);
        assert!(settings.signing.is_none());
    }

    #[test]
    fn test_load_settings_defaults() {
        let settings = load_settings(None).expect("should load embedded defaults");
        assert!(!settings.http.user_agent.is_empty());
    }

    #[test]
    fn test_load_settings_invalid_file() {
        let file = write_config("[http]\ntimeout_secs = 0\nuser_agent = \"x\"\n");
        assert!(matches!(
            load_settings(Some(file.path())),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_load_settings_missing_file() {
        let result = load_settings(Some(Path::new("/nonexistent/litepub.toml")));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
