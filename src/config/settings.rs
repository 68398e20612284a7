use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub http: HttpConfig,
    pub dispatch: DispatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub pool_idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Characters of a failed request's error kept in the diagnostic line
    pub error_preview_chars: usize,
    pub progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

impl LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.level.trim()).map_err(|_| {
            ConfigError::Message(format!(
                "invalid logging.level {:?}: expected off, error, warn, info, debug or trace",
                self.level
            ))
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http: HttpConfig {
                timeout_secs: 600,
                connect_timeout_secs: 10,
                pool_idle_timeout_secs: 90,
            },
            dispatch: DispatchConfig {
                error_preview_chars: 100,
                progress: true,
            },
            logging: LoggingConfig {
                level: "warn".to_string(),
            },
        }
    }
}

impl Settings {
    /// Built-in defaults, then `config/{CONFIG_ENV}` if present, then
    /// `BATCHGEN__SECTION__KEY` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let builder = Self::builder()?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("BATCHGEN").separator("__"));

        Self::load(builder)
    }

    fn load(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.logging.level_filter()?;
        Ok(settings)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = Settings::default();

        Config::builder()
            .set_default("http.timeout_secs", defaults.http.timeout_secs)?
            .set_default("http.connect_timeout_secs", defaults.http.connect_timeout_secs)?
            .set_default("http.pool_idle_timeout_secs", defaults.http.pool_idle_timeout_secs)?
            .set_default(
                "dispatch.error_preview_chars",
                defaults.dispatch.error_preview_chars as u64,
            )?
            .set_default("dispatch.progress", defaults.dispatch.progress)?
            .set_default("logging.level", defaults.logging.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let settings = Settings::load(Settings::builder().unwrap()).unwrap();

        assert_eq!(settings.http.timeout_secs, 600);
        assert_eq!(settings.http.connect_timeout_secs, 10);
        assert_eq!(settings.dispatch.error_preview_chars, 100);
        assert!(settings.dispatch.progress);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[http]\ntimeout_secs = 30\n\n[dispatch]\nprogress = false").unwrap();

        let settings =
            Settings::load(Settings::builder().unwrap().add_source(File::from(file.path()))).unwrap();

        assert_eq!(settings.http.timeout(), Duration::from_secs(30));
        assert!(!settings.dispatch.progress);
        // untouched keys keep their defaults
        assert_eq!(settings.http.connect_timeout_secs, 10);
    }

    #[test]
    fn test_level_names_accepted() {
        for level in ["off", "error", "warn", "INFO", "debug", "trace"] {
            let logging = LoggingConfig {
                level: level.to_string(),
            };
            assert!(logging.level_filter().is_ok(), "{} should parse", level);
        }

        let settings = Settings::default();
        assert_eq!(settings.logging.level_filter().unwrap(), LevelFilter::WARN);
    }

    #[test]
    fn test_misspelled_level_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[logging]\nlevel = \"warning\"").unwrap();

        let err = Settings::load(Settings::builder().unwrap().add_source(File::from(file.path())))
            .unwrap_err();
        assert!(err.to_string().contains("warning"));
    }
}
