use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::monitor::MonitorConfig;
use crate::pagespeed::{DEFAULT_ENDPOINT, PageSpeedSettings};

const DEFAULT_OUTPUT: &str = "text";
const DEFAULT_LISTEN: &str = "127.0.0.1:8787";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_DEADLINE_SECS: u64 = 45;
const DEFAULT_PAGESPEED_TIMEOUT_SECS: u64 = 30;

/// Settings read from `webpulse.{json,toml,yaml,yml}`
///
/// Every field is optional; anything left out falls back to the CLI value.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub output: Option<String>,
    pub save: Option<String>,
    pub verbose: Option<bool>,
    pub listen: Option<String>,
    /// Seconds allowed for the page fetch and each HEAD probe
    pub timeout: Option<u64>,
    /// Seconds allowed for the whole probe
    pub deadline: Option<u64>,
    pub pagespeed_key: Option<String>,
    pub pagespeed_endpoint: Option<String>,
    /// Seconds allowed for each PageSpeed request
    pub pagespeed_timeout: Option<u64>,
    pub pagespeed_seo: Option<bool>,
}

/// Extensions searched in the working directory and the user config directory, in priority order
const SEARCH_EXTENSIONS: [&str; 4] = ["json", "toml", "yaml", "yml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }

    fn parse(self, contents: &str, path: &Path) -> Result<Config> {
        let parsed = match self {
            ConfigFormat::Json => serde_json::from_str(contents).map_err(anyhow::Error::from),
            ConfigFormat::Toml => toml::from_str(contents).map_err(anyhow::Error::from),
            ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(anyhow::Error::from),
        };
        parsed.with_context(|| format!("Failed to parse {:?} config: {}", self, path.display()))
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)
            .with_context(|| format!("Unsupported config file format: {}", path.display()))?;
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        format.parse(&contents, path)
    }

    /// Candidate config files: `./webpulse.*` first, then `<config home>/webpulse/config.*`
    ///
    /// The config home is `$XDG_CONFIG_HOME` when set and non-empty, otherwise `~/.config`.
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = SEARCH_EXTENSIONS
            .iter()
            .map(|ext| PathBuf::from(format!("webpulse.{}", ext)))
            .collect();

        if let Some(dir) = config_home().map(|home| home.join("webpulse")) {
            paths.extend(
                SEARCH_EXTENSIONS
                    .iter()
                    .map(|ext| dir.join(format!("config.{}", ext))),
            );
        }

        paths
    }

    /// Loads the first candidate file that exists
    pub fn from_default_paths() -> Result<Option<Self>> {
        Self::default_paths()
            .into_iter()
            .find(|path| path.exists())
            .map(|path| Self::from_file(&path))
            .transpose()
    }

    /// Loads the file named by `--config`, or the first default path that exists
    pub fn load(cli: &Cli) -> Result<Option<Self>> {
        match &cli.config {
            Some(path) => Self::from_file(Path::new(path)).map(Some),
            None => Self::from_default_paths(),
        }
    }

    /// Folds file values into the CLI arguments; a CLI value left at its default yields to the file
    pub fn merge_with_cli(&self, cli: &Cli) -> Cli {
        Cli {
            url: cli.url.clone(),
            output: if cli.output != DEFAULT_OUTPUT {
                cli.output.clone()
            } else {
                self.output.clone().unwrap_or_else(|| cli.output.clone())
            },
            save: cli.save.clone().or_else(|| self.save.clone()),
            verbose: cli.verbose || self.verbose.unwrap_or(false),
            serve: cli.serve,
            listen: if cli.listen != DEFAULT_LISTEN {
                cli.listen.clone()
            } else {
                self.listen.clone().unwrap_or_else(|| cli.listen.clone())
            },
            timeout: if cli.timeout != DEFAULT_TIMEOUT_SECS {
                cli.timeout
            } else {
                self.timeout.unwrap_or(cli.timeout)
            },
            deadline: if cli.deadline != DEFAULT_DEADLINE_SECS {
                cli.deadline
            } else {
                self.deadline.unwrap_or(cli.deadline)
            },
            pagespeed_key: cli
                .pagespeed_key
                .clone()
                .or_else(|| self.pagespeed_key.clone()),
            pagespeed_endpoint: if cli.pagespeed_endpoint != DEFAULT_ENDPOINT {
                cli.pagespeed_endpoint.clone()
            } else {
                self.pagespeed_endpoint
                    .clone()
                    .unwrap_or_else(|| cli.pagespeed_endpoint.clone())
            },
            pagespeed_timeout: if cli.pagespeed_timeout != DEFAULT_PAGESPEED_TIMEOUT_SECS {
                cli.pagespeed_timeout
            } else {
                self.pagespeed_timeout.unwrap_or(cli.pagespeed_timeout)
            },
            pagespeed_seo: cli.pagespeed_seo || self.pagespeed_seo.unwrap_or(false),
            config: cli.config.clone(),
        }
    }
}

fn config_home() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
}

/// Builds the monitor configuration from merged CLI arguments
pub fn monitor_config(cli: &Cli) -> MonitorConfig {
    let pagespeed = cli
        .pagespeed_key
        .as_ref()
        .filter(|key| !key.trim().is_empty())
        .map(|key| PageSpeedSettings {
            api_key: key.clone(),
            endpoint: cli.pagespeed_endpoint.clone(),
            timeout: Duration::from_secs(cli.pagespeed_timeout),
            include_seo: cli.pagespeed_seo,
        });

    MonitorConfig {
        request_timeout: Duration::from_secs(cli.timeout),
        deadline: Duration::from_secs(cli.deadline),
        pagespeed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    fn default_cli() -> Cli {
        Cli::parse_from(["webpulse", "https://example.com"])
    }

    #[test]
    fn test_config_format_from_path() {
        for (name, expected) in [
            ("config.json", Some(ConfigFormat::Json)),
            ("config.TOML", Some(ConfigFormat::Toml)),
            ("config.yaml", Some(ConfigFormat::Yaml)),
            ("config.yml", Some(ConfigFormat::Yaml)),
            ("config.txt", None),
            ("config", None),
        ] {
            assert_eq!(ConfigFormat::from_path(Path::new(name)), expected, "{}", name);
        }
    }

    #[test]
    fn test_load_json_config() {
        let json_content = r#"
{
    "output": "json",
    "timeout": 5,
    "deadline": 12,
    "pagespeed_key": "secret",
    "pagespeed_seo": true
}
        "#;

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().with_extension("json");
        fs::write(&temp_path, json_content).unwrap();

        let config = Config::from_file(&temp_path).unwrap();
        assert_eq!(config.output, Some("json".to_string()));
        assert_eq!(config.timeout, Some(5));
        assert_eq!(config.deadline, Some(12));
        assert_eq!(config.pagespeed_key, Some("secret".to_string()));
        assert_eq!(config.pagespeed_seo, Some(true));

        fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_load_toml_config() {
        let toml_content = r#"
listen = "0.0.0.0:9000"
pagespeed_timeout = 10
verbose = true
        "#;

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().with_extension("toml");
        fs::write(&temp_path, toml_content).unwrap();

        let config = Config::from_file(&temp_path).unwrap();
        assert_eq!(config.listen, Some("0.0.0.0:9000".to_string()));
        assert_eq!(config.pagespeed_timeout, Some(10));
        assert_eq!(config.verbose, Some(true));
        assert_eq!(config.output, None);

        fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_load_yaml_config() {
        let yaml_content = r#"
output: json
save: result.json
timeout: 8
        "#;

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().with_extension("yml");
        fs::write(&temp_path, yaml_content).unwrap();

        let config = Config::from_file(&temp_path).unwrap();
        assert_eq!(config.output, Some("json".to_string()));
        assert_eq!(config.save, Some("result.json".to_string()));
        assert_eq!(config.timeout, Some(8));

        fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_invalid_configs() {
        for (ext, content) in [
            ("json", "{ invalid json }"),
            ("toml", "[[[ invalid toml"),
            ("yaml", "output: \"test\n    timeout: invalid"),
            ("txt", "content"),
        ] {
            let temp_file = NamedTempFile::new().unwrap();
            let temp_path = temp_file.path().with_extension(ext);
            fs::write(&temp_path, content).unwrap();

            assert!(
                Config::from_file(&temp_path).is_err(),
                "{} config should fail to load",
                ext
            );

            fs::remove_file(temp_path).ok();
        }
    }

    #[test]
    fn test_merge_with_cli_defaults() {
        let config = Config {
            output: Some("json".to_string()),
            timeout: Some(5),
            deadline: Some(10),
            pagespeed_key: Some("from-file".to_string()),
            ..Default::default()
        };

        let mut cli = default_cli();
        cli.pagespeed_key = None;

        let merged = config.merge_with_cli(&cli);
        assert_eq!(merged.url.as_deref(), Some("https://example.com"));
        assert_eq!(merged.output, "json");
        assert_eq!(merged.timeout, 5);
        assert_eq!(merged.deadline, 10);
        assert_eq!(merged.listen, DEFAULT_LISTEN);
        assert_eq!(merged.pagespeed_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_merge_with_cli_overrides() {
        let config = Config {
            output: Some("json".to_string()),
            timeout: Some(5),
            listen: Some("0.0.0.0:1".to_string()),
            ..Default::default()
        };

        let cli = Cli::parse_from([
            "webpulse",
            "example.com",
            "--output",
            "text",
            "--timeout",
            "7",
            "--listen",
            "127.0.0.1:9999",
            "--pagespeed-key",
            "from-cli",
        ]);

        let merged = config.merge_with_cli(&cli);
        assert_eq!(merged.output, "json"); // "text" is the default, file wins
        assert_eq!(merged.timeout, 7);
        assert_eq!(merged.listen, "127.0.0.1:9999");
        assert_eq!(merged.pagespeed_key.as_deref(), Some("from-cli"));
    }

    #[test]
    fn test_monitor_config_without_key() {
        let mut cli = default_cli();
        cli.pagespeed_key = None;

        let config = monitor_config(&cli);
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.deadline, Duration::from_secs(45));
        assert!(config.pagespeed.is_none());
    }

    #[test]
    fn test_monitor_config_with_key() {
        let mut cli = default_cli();
        cli.pagespeed_key = Some("key".to_string());
        cli.pagespeed_seo = true;

        let config = monitor_config(&cli);
        let pagespeed = config.pagespeed.unwrap();
        assert_eq!(pagespeed.api_key, "key");
        assert_eq!(pagespeed.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(pagespeed.timeout, Duration::from_secs(30));
        assert!(pagespeed.include_seo);
    }

    #[test]
    fn test_default_paths_exists() {
        let paths = Config::default_paths();
        assert!(
            paths
                .iter()
                .any(|p| p.to_string_lossy().contains("webpulse.json"))
        );
        assert!(
            paths
                .iter()
                .any(|p| p.to_string_lossy().contains("webpulse.yml"))
        );
    }

    #[test]
    #[serial]
    fn test_default_paths_with_xdg_config_home() {
        use std::env;

        unsafe {
            env::set_var("XDG_CONFIG_HOME", "/custom/config/path");
        }

        let paths = Config::default_paths();
        assert!(
            paths
                .iter()
                .any(|p| p.to_string_lossy().contains("/custom/config/path/webpulse"))
        );

        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    #[serial]
    fn test_from_default_paths_priority_order() {
        use std::env;
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(temp_dir.path()).unwrap();

        let temp_config_dir = tempdir().unwrap();
        let config_dir = temp_config_dir.path().join("webpulse");
        fs::create_dir_all(&config_dir).unwrap();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp_config_dir.path());
        }

        fs::write(temp_dir.path().join("webpulse.json"), r#"{"timeout": 3}"#).unwrap();
        fs::write(config_dir.join("config.toml"), "timeout = 9").unwrap();

        let config = Config::from_default_paths().unwrap().unwrap();
        assert_eq!(config.timeout, Some(3));

        fs::remove_file(temp_dir.path().join("webpulse.json")).unwrap();
        let config = Config::from_default_paths().unwrap().unwrap();
        assert_eq!(config.timeout, Some(9));

        env::set_current_dir(&original_dir).ok();
        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    #[serial]
    fn test_from_default_paths_returns_none_when_no_config_exists() {
        use std::env;
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(temp_dir.path()).unwrap();

        let temp_config_dir = tempdir().unwrap();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp_config_dir.path());
        }

        let result = Config::from_default_paths();
        assert!(result.is_ok());
        assert!(result.unwrap().is_none());

        env::set_current_dir(&original_dir).ok();
        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }
}
