//! Client configuration.
//!
//! Precedence: CLI flags > CHATDESK_* environment > config file > defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chatdesk_api::{normalize_base_url, DEFAULT_SERVER_URL};
use chatdesk_session::DEFAULT_DEBOUNCE;

use crate::cli::Cli;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolved configuration of the terminal client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server_url: String,
    pub search_debounce: Duration,
    pub data_dir: PathBuf,
    pub transcript_log: bool,
}

/// Optional settings read from the TOML config file
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub server_url: Option<String>,
    pub search_debounce_ms: Option<u64>,
    pub transcript_log: Option<bool>,
}

impl FileConfig {
    /// Read `path`. A missing file is only an error when `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Settings taken from CHATDESK_* environment variables
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub server_url: Option<String>,
    pub search_debounce_ms: Option<u64>,
    pub data_dir: Option<PathBuf>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let search_debounce_ms = match lookup("CHATDESK_DEBOUNCE_MS") {
            Some(value) => Some(
                value
                    .trim()
                    .parse()
                    .with_context(|| format!("CHATDESK_DEBOUNCE_MS is not a number: {}", value))?,
            ),
            None => None,
        };

        Ok(Self {
            server_url: lookup("CHATDESK_SERVER_URL").filter(|s| !s.trim().is_empty()),
            search_debounce_ms,
            data_dir: lookup("CHATDESK_DATA_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

impl AppConfig {
    /// Resolve the configuration for this run from all sources
    pub fn load(cli: &Cli) -> Result<Self> {
        let env = EnvConfig::from_env()?;

        let data_dir = match cli.data_dir.clone().or_else(|| env.data_dir.clone()) {
            Some(dir) => dir,
            None => chatdesk_logging::default_data_dir()?,
        };
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
        let file = FileConfig::load(&config_path, cli.config.is_some())?;

        Self::merge(cli, &env, &file, data_dir)
    }

    /// Apply the precedence rules to already gathered sources
    pub fn merge(cli: &Cli, env: &EnvConfig, file: &FileConfig, data_dir: PathBuf) -> Result<Self> {
        let server_url = cli
            .server_url
            .clone()
            .or_else(|| env.server_url.clone())
            .or_else(|| file.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let search_debounce = cli
            .debounce_ms
            .or(env.search_debounce_ms)
            .or(file.search_debounce_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE);

        Ok(Self {
            server_url: normalize_base_url(&server_url)?,
            search_debounce,
            data_dir,
            transcript_log: cli.transcript_log || file.transcript_log.unwrap_or(false),
        })
    }

    pub fn credential_path(&self) -> PathBuf {
        self.data_dir.join("credentials.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["chatdesk"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::merge(
            &cli(&[]),
            &EnvConfig::default(),
            &FileConfig::default(),
            PathBuf::from("/tmp/chatdesk"),
        )
        .unwrap();

        assert_eq!(
            config,
            AppConfig {
                server_url: "http://127.0.0.1:8000".into(),
                search_debounce: Duration::from_millis(500),
                data_dir: PathBuf::from("/tmp/chatdesk"),
                transcript_log: false,
            }
        );
        assert_eq!(
            config.credential_path(),
            PathBuf::from("/tmp/chatdesk/credentials.json")
        );
    }

    #[test]
    fn test_cli_beats_env_beats_file() {
        let env = EnvConfig {
            server_url: Some("http://env:1".into()),
            search_debounce_ms: Some(200),
            data_dir: None,
        };
        let file = FileConfig {
            server_url: Some("http://file:2".into()),
            search_debounce_ms: Some(300),
            transcript_log: Some(true),
        };

        let from_cli = AppConfig::merge(
            &cli(&["--server-url", "http://cli:3/"]),
            &env,
            &file,
            PathBuf::from("/d"),
        )
        .unwrap();
        assert_eq!(from_cli.server_url, "http://cli:3");
        assert_eq!(from_cli.search_debounce, Duration::from_millis(200));
        assert!(from_cli.transcript_log);

        let from_file =
            AppConfig::merge(&cli(&[]), &EnvConfig::default(), &file, PathBuf::from("/d")).unwrap();
        assert_eq!(from_file.server_url, "http://file:2");
        assert_eq!(from_file.search_debounce, Duration::from_millis(300));
    }

    #[test]
    fn test_invalid_server_url_is_rejected() {
        let result = AppConfig::merge(
            &cli(&["--server-url", "chat.local"]),
            &EnvConfig::default(),
            &FileConfig::default(),
            PathBuf::from("/d"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_env_lookup() {
        let vars: HashMap<&str, &str> = [
            ("CHATDESK_SERVER_URL", "https://chat.example.com"),
            ("CHATDESK_DEBOUNCE_MS", " 750 "),
            ("CHATDESK_DATA_DIR", "/var/lib/chatdesk"),
        ]
        .into_iter()
        .collect();

        let env = EnvConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(env.server_url.as_deref(), Some("https://chat.example.com"));
        assert_eq!(env.search_debounce_ms, Some(750));
        assert_eq!(env.data_dir, Some(PathBuf::from("/var/lib/chatdesk")));
    }

    #[test]
    fn test_env_debounce_must_be_numeric() {
        let result = EnvConfig::from_lookup(|key| {
            (key == "CHATDESK_DEBOUNCE_MS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_file_config_load() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);

        assert_eq!(FileConfig::load(&path, false).unwrap(), FileConfig::default());
        assert!(FileConfig::load(&path, true).is_err());

        std::fs::write(
            &path,
            "server_url = \"http://10.0.0.5:8000\"\nsearch_debounce_ms = 100\n",
        )
        .unwrap();
        let file = FileConfig::load(&path, true).unwrap();
        assert_eq!(file.server_url.as_deref(), Some("http://10.0.0.5:8000"));
        assert_eq!(file.search_debounce_ms, Some(100));
        assert_eq!(file.transcript_log, None);

        std::fs::write(&path, "colour = \"blue\"\n").unwrap();
        assert!(FileConfig::load(&path, true).is_err());
    }
}
