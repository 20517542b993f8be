use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strata_engine::DiscoveryOptions;
use strata_syntax::TextFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid format pattern {pattern:?} in {config_path}: {source}")]
    InvalidPattern {
        config_path: PathBuf,
        pattern: String,
        source: glob::PatternError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    /// Formats forced for files matching a glob, checked in order.
    #[serde(rename = "format", skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<FormatOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub garbage_limit: usize,
    pub indent_guides: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let options = DiscoveryOptions::default();
        Self {
            garbage_limit: options.garbage_limit,
            indent_guides: options.indent_guides,
        }
    }
}

impl From<&DiscoveryConfig> for DiscoveryOptions {
    fn from(config: &DiscoveryConfig) -> Self {
        DiscoveryOptions {
            garbage_limit: config.garbage_limit,
            indent_guides: config.indent_guides,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatOverride {
    /// Glob matched against the file name, or against the whole path when
    /// it contains a `/`. `~` and environment variables are expanded.
    pub pattern: String,
    pub format: TextFormat,
}

impl FormatOverride {
    fn compile(&self) -> Result<glob::Pattern, glob::PatternError> {
        let expanded = shellexpand::full(&self.pattern)
            .map(|expanded| expanded.into_owned())
            .unwrap_or_else(|_| self.pattern.clone());
        glob::Pattern::new(&expanded)
    }

    fn matches(&self, path: &Path) -> bool {
        let Ok(pattern) = self.compile() else {
            return false;
        };
        if self.pattern.contains('/') {
            pattern.matches_path(path)
        } else {
            path.file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        for format in &config.formats {
            format
                .compile()
                .map_err(|source| ConfigError::InvalidPattern {
                    config_path: config_path.to_path_buf(),
                    pattern: format.pattern.clone(),
                    source,
                })?;
        }

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/strata");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions::from(&self.discovery)
    }

    /// The first override whose pattern matches `path`.
    pub fn format_for(&self, path: &Path) -> Option<TextFormat> {
        self.formats
            .iter()
            .find(|format| format.matches(path))
            .map(|format| format.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/strata/config.toml"));
    }

    #[test]
    fn test_defaults_match_engine() {
        let config = Config::default();
        assert_eq!(config.discovery_options(), DiscoveryOptions::default());
        assert!(config.formats.is_empty());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str("[discovery]\ngarbage_limit = 50\n").unwrap();
        assert_eq!(config.discovery.garbage_limit, 50);
        assert!(config.discovery.indent_guides);

        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_format_overrides() {
        let config: Config = toml::from_str(
            r#"
[[format]]
pattern = "*.conf"
format = "toml"

[[format]]
pattern = "/var/log/app/*"
format = "log"

[[format]]
pattern = "*"
format = "plain-text"
"#,
        )
        .unwrap();

        assert_eq!(
            config.format_for(Path::new("/etc/app.conf")),
            Some(TextFormat::Toml)
        );
        assert_eq!(
            config.format_for(Path::new("/var/log/app/current")),
            Some(TextFormat::Log)
        );
        assert_eq!(
            config.format_for(Path::new("notes")),
            Some(TextFormat::PlainText)
        );
    }

    #[test]
    fn test_format_pattern_expands_env_vars() {
        unsafe {
            env::set_var("STRATA_TEST_LOGS", "/srv/logs");
        }

        let config = Config {
            formats: vec![FormatOverride {
                pattern: "$STRATA_TEST_LOGS/*.out".to_string(),
                format: TextFormat::Log,
            }],
            ..Config::default()
        };
        assert_eq!(
            config.format_for(Path::new("/srv/logs/job.out")),
            Some(TextFormat::Log)
        );
        assert_eq!(config.format_for(Path::new("/tmp/job.out")), None);

        unsafe {
            env::remove_var("STRATA_TEST_LOGS");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            discovery: DiscoveryConfig {
                garbage_limit: 10,
                indent_guides: false,
            },
            formats: vec![FormatOverride {
                pattern: "*.cfg".to_string(),
                format: TextFormat::Yaml,
            }],
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_unparseable_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[discovery\ngarbage_limit = ").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "[[format]]\npattern = \"[unclosed\"\nformat = \"json\"\n",
        )
        .unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
