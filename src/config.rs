use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable replacing `api.url`.
pub const API_URL_ENV: &str = "SCOLAIRE_API_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// School whose lists are shown
  pub school_id: i64,
  /// School year used by year-scoped lists and certificates
  pub year_id: i64,
  /// Where downloaded files go (defaults to the user's download directory)
  pub download_dir: Option<PathBuf>,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub table: TableConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub url: String,
  /// Timeout for reads and plain writes
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
  /// Timeout for requests producing a file
  #[serde(default = "default_download_timeout")]
  pub download_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_ttl")]
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_ttl(),
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
  #[serde(default = "default_page_size")]
  pub page_size: usize,
}

impl Default for TableConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

fn default_timeout() -> u64 {
  20
}

fn default_download_timeout() -> u64 {
  30
}

fn default_ttl() -> u64 {
  300
}

fn default_page_size() -> usize {
  20
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./scolaire.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/scolaire/config.yaml
  ///
  /// `SCOLAIRE_API_URL` then overrides `api.url`.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => {
        return Err(eyre!(
          "No configuration file found. Create one at ~/.config/scolaire/config.yaml\n\
                 See config.example.yaml for the format."
        ))
      }
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
      config.apply_api_url(url);
    }
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("scolaire.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("scolaire").join("config.yaml");
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

  fn apply_api_url(&mut self, url: String) {
    if !url.trim().is_empty() {
      self.api.url = url;
    }
  }

  fn validate(&self) -> Result<()> {
    url::Url::parse(&self.api.url).map_err(|e| eyre!("Invalid api.url {:?}: {}", self.api.url, e))?;
    if self.table.page_size == 0 {
      return Err(eyre!("table.page_size must be at least 1"));
    }
    Ok(())
  }

  /// Directory for downloaded certificates and exports.
  pub fn download_dir(&self) -> PathBuf {
    self
      .download_dir
      .clone()
      .or_else(dirs::download_dir)
      .unwrap_or_else(|| PathBuf::from("."))
  }

  /// Header title: configured title, else the API host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    url::Url::parse(&self.api.url)
      .ok()
      .and_then(|u| u.host_str().map(str::to_string))
      .unwrap_or_else(|| "scolaire".to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MINIMAL: &str = "
api:
  url: http://localhost:8889/api/
school_id: 38
year_id: 226
";

  #[test]
  fn test_defaults() {
    let config = Config::parse(MINIMAL).unwrap();

    assert_eq!(config.api.timeout_secs, 20);
    assert_eq!(config.api.download_timeout_secs, 30);
    assert_eq!(config.cache.ttl(), Duration::from_secs(300));
    assert_eq!(config.table.page_size, 20);
    assert_eq!(config.display_title(), "localhost");
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_full_file() {
    let config = Config::parse(
      "
api:
  url: https://scolaire.example.ci/api/
  timeout_secs: 5
  download_timeout_secs: 15
cache:
  ttl_secs: 60
school_id: 12
year_id: 3
download_dir: /tmp/exports
title: Lycée Moderne
table:
  page_size: 50
",
    )
    .unwrap();

    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.cache.ttl_secs, 60);
    assert_eq!(config.download_dir(), PathBuf::from("/tmp/exports"));
    assert_eq!(config.display_title(), "Lycée Moderne");
    assert_eq!(config.table.page_size, 50);
  }

  #[test]
  fn test_missing_school_is_an_error() {
    assert!(Config::parse("api:\n  url: http://x/\nyear_id: 1\n").is_err());
  }

  #[test]
  fn test_api_url_override_and_validation() {
    let mut config = Config::parse(MINIMAL).unwrap();

    config.apply_api_url("  ".to_string());
    assert_eq!(config.api.url, "http://localhost:8889/api/");

    config.apply_api_url("not a url".to_string());
    assert!(config.validate().is_err());

    config.apply_api_url("http://10.0.0.2:8080/api/".to_string());
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_explicit_missing_path() {
    let err = Config::load(Some(Path::new("/nonexistent/scolaire.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
