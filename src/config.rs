use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::query::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL that resource paths are appended to (e.g., https://host/api/)
  pub url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  #[serde(default = "default_page_size")]
  pub page_size: usize,
  /// How many records `recent` asks for
  #[serde(default = "default_recent_limit")]
  pub recent_limit: usize,
}

fn default_page_size() -> usize {
  DEFAULT_PAGE_SIZE
}

fn default_recent_limit() -> usize {
  5
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
      recent_limit: default_recent_limit(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
  /// Filter directive used when RUST_LOG is unset
  #[serde(default = "default_level")]
  pub level: String,
  /// Write daily-rolling log files here instead of stderr
  pub directory: Option<PathBuf>,
}

fn default_level() -> String {
  "info".to_string()
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_level(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./fintrack.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/fintrack/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/fintrack/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("fintrack.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("fintrack").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Bearer token for the API, from FINTRACK_API_TOKEN.
  ///
  /// Optional: a backend without auth needs none.
  pub fn api_token() -> Option<String> {
    std::env::var("FINTRACK_API_TOKEN")
      .ok()
      .filter(|token| !token.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::parse("api:\n  url: https://finance.example.com/api/\n").unwrap();
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.store.page_size, 20);
    assert_eq!(config.store.recent_limit, 5);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.directory.is_none());
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
api:
  url: http://localhost:8080/
  timeout_secs: 5
store:
  page_size: 50
  recent_limit: 10
logging:
  level: fintrack=debug
  directory: /tmp/fintrack-logs
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.store.page_size, 50);
    assert_eq!(config.logging.level, "fintrack=debug");
    assert_eq!(
      config.logging.directory.as_deref(),
      Some(Path::new("/tmp/fintrack-logs"))
    );
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let err = Config::load(Some(Path::new("/nonexistent/fintrack.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
