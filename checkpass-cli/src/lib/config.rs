use std::env;

use checkpass::Defaults;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Generation defaults per scheme
    #[serde(default)]
    pub defaults: Defaults,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (CHECKPASS__DEFAULTS__BCRYPT__COST, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: CHECKPASS__DEFAULTS__SCRYPT__LN=14 overrides defaults.scrypt.ln
            .add_source(
                Environment::with_prefix("CHECKPASS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        configuration.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(document: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()
            .expect("Failed to build configuration")
            .try_deserialize()
            .expect("Failed to deserialize configuration")
    }

    #[test]
    fn test_empty_document_uses_builtin_defaults() {
        assert_eq!(from_toml("").defaults, Defaults::default());
    }

    #[test]
    fn test_partial_overrides() {
        let config = from_toml(
            r#"
            [defaults.bcrypt]
            cost = 10

            [defaults.sha2_crypt]
            rounds = 20000
            "#,
        );

        assert_eq!(config.defaults.bcrypt.cost, 10);
        assert_eq!(config.defaults.bcrypt.ident, "2b");
        assert_eq!(config.defaults.sha2_crypt.rounds, Some(20000));
        assert_eq!(config.defaults.argon2, Defaults::default().argon2);
    }
}
