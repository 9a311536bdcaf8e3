use std::str;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::Deserialize;
use validator::Validate;

use crate::error::LitePubError;

const ENV_PREFIX: &str = "LITEPUB";

/// Transport defaults shared by every outbound call.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HttpSettings {
    /// Global per-request timeout; the only bound on a stalled remote.
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
    #[validate(length(min = 1))]
    pub user_agent: String,
}

/// Identity used for signing outbound deliveries.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SigningSettings {
    /// Public key id advertised in the `Signature` header, usually
    /// `<actor-url>#main-key`.
    #[validate(url)]
    pub key_id: String,
    /// Path to a PKCS#1 PEM private key.
    #[validate(length(min = 1))]
    pub private_key_path: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub http: HttpSettings,
    #[validate(nested)]
    pub signing: Option<SigningSettings>,
}

impl Settings {
    /// Load the embedded defaults, merged with `LITEPUB__` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::Configuration`] if the merged settings do not
    /// deserialize or validate.
    pub fn new() -> Result<Self, Report<LitePubError>> {
        let toml_bytes = include_bytes!("../../../litepub.toml");
        let toml_str = str::from_utf8(toml_bytes).change_context(LitePubError::Configuration {
            message: "embedded litepub.toml is not UTF-8".into(),
        })?;

        Self::from_toml(toml_str)
    }

    /// Parse settings from a TOML string, merged with `LITEPUB__` environment
    /// overrides (`LITEPUB__HTTP__TIMEOUT_SECS=5` overrides `http.timeout_secs`).
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::Configuration`] on invalid TOML, missing fields
    /// or failed validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<LitePubError>> {
        Self::from_toml_with_env_prefix(toml_str, ENV_PREFIX)
    }

    fn from_toml_with_env_prefix(
        toml_str: &str,
        env_prefix: &str,
    ) -> Result<Self, Report<LitePubError>> {
        let environment = Environment::default().prefix(env_prefix).separator("__");

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(LitePubError::Configuration {
                message: "Failed to build configuration".into(),
            })?;

        let settings: Self = config
            .try_deserialize()
            .change_context(LitePubError::Configuration {
                message: "Failed to deserialize configuration".into(),
            })?;

        settings.validate().map_err(|e| {
            Report::new(LitePubError::Configuration {
                message: format!("Settings validation failed: {}", e),
            })
        })?;

        Ok(settings)
    }

    /// The signing section, which is optional for read-only use.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::Configuration`] if `[signing]` is absent.
    pub fn require_signing(&self) -> Result<&SigningSettings, Report<LitePubError>> {
        self.signing.as_ref().ok_or_else(|| {
            Report::new(LitePubError::Configuration {
                message: "missing [signing] section".into(),
            })
        })
    }
}
