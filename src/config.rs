use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const BASE_URL_ENV: &str = "AIPROFS_API_URL";
pub const LOG_FILE_ENV: &str = "AIPROFS_LOG_FILE";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file from the user config directory, or defaults if it
    /// doesn't exist yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", config_path.display(), e))?;
        Ok(config)
    }

    /// Layer overrides on top of the file values. Earlier sources win:
    /// command line, then environment, then the file.
    pub fn merge(self, cli: Config, env: Config) -> Self {
        Self {
            base_url: cli.base_url.or(env.base_url).or(self.base_url),
            log_file: cli.log_file.or(env.log_file).or(self.log_file),
        }
    }

    /// Values from `AIPROFS_API_URL` / `AIPROFS_LOG_FILE`, including any set
    /// through a `.env` file.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        Self {
            base_url: non_empty_var(BASE_URL_ENV),
            log_file: non_empty_var(LOG_FILE_ENV).map(PathBuf::from),
        }
    }

    pub fn base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No assistant API URL configured. Set {} (e.g. {}=http://localhost:8000), \
                     pass --base-url, or add \"base_url\" to the config file.",
                    BASE_URL_ENV,
                    BASE_URL_ENV
                )
            })
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("aiprofs").join("config.json"))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn with_url(url: &str) -> Config {
        Config {
            base_url: Some(url.to_string()),
            log_file: None,
        }
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"base_url": "https://api.example.com", "log_file": "/tmp/aiprofs.log"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url().unwrap(), "https://api.example.com");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/aiprofs.log")));
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_merge_precedence() {
        let file = with_url("http://file");
        let env = with_url("http://env");
        let cli = with_url("http://cli");

        assert_eq!(
            file.clone().merge(cli, env.clone()).base_url().unwrap(),
            "http://cli"
        );
        assert_eq!(
            file.clone().merge(Config::new(), env).base_url().unwrap(),
            "http://env"
        );
        assert_eq!(
            file.merge(Config::new(), Config::new()).base_url().unwrap(),
            "http://file"
        );
    }

    #[test]
    fn test_missing_base_url_is_error() {
        let err = Config::new().base_url().unwrap_err();
        assert!(err.to_string().contains(BASE_URL_ENV));

        let blank = with_url("   ");
        assert!(blank.base_url().is_err());
    }
}
