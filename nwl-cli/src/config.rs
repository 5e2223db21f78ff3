use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

use nwl_core::store::DEFAULT_API_BASE;

/// Repository the list lives in unless configured otherwise.
pub const DEFAULT_REPO_URL: &str = "https://github.com/Abuigsito/nowavelist";

/// Folder inside the repository holding the level files.
pub const DEFAULT_FOLDER: &str = "data";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Hides all but the last four characters of a token.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn serialize_masked<S>(token: &Option<ConfigValue<String>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let masked = token
        .as_ref()
        .map(|t| ConfigValue::new(mask_token(&t.value), t.source.clone()));
    masked.serialize(serializer)
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// GitHub repository holding the list
    pub repo_url: ConfigValue<String>,
    /// Folder of level files inside the repository
    pub folder: ConfigValue<String>,
    /// GitHub REST API base URL
    pub api_base: ConfigValue<String>,
    /// Personal access token; reads work without one
    #[serde(serialize_with = "serialize_masked")]
    pub token: Option<ConfigValue<String>>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    repo_url: Option<String>,
    folder: Option<String>,
    api_base: Option<String>,
    token: Option<String>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut repo_url = ConfigValue::new(DEFAULT_REPO_URL.to_string(), ConfigSource::Default);
        let mut folder = ConfigValue::new(DEFAULT_FOLDER.to_string(), ConfigSource::Default);
        let mut api_base = ConfigValue::new(DEFAULT_API_BASE.to_string(), ConfigSource::Default);
        let mut token = None;
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.repo_url {
                repo_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(dir) = file_config.folder {
                folder = ConfigValue::new(dir, ConfigSource::File);
            }
            if let Some(base) = file_config.api_base {
                api_base = ConfigValue::new(base, ConfigSource::File);
            }
            if let Some(t) = file_config.token.filter(|t| !t.trim().is_empty()) {
                token = Some(ConfigValue::new(t, ConfigSource::File));
            }
        }

        if let Ok(url) = std::env::var("NWL_REPO_URL") {
            repo_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("NWL_FOLDER") {
            folder = ConfigValue::new(dir, ConfigSource::Environment);
        }
        if let Ok(base) = std::env::var("NWL_API_BASE") {
            api_base = ConfigValue::new(base, ConfigSource::Environment);
        }
        if let Ok(t) = std::env::var("NWL_TOKEN") {
            if !t.trim().is_empty() {
                token = Some(ConfigValue::new(t, ConfigSource::Environment));
            }
        }

        folder.value = folder.value.trim_matches('/').to_string();

        Ok(Self {
            repo_url,
            folder,
            api_base,
            token,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/nwl/
    /// - macOS: ~/Library/Application Support/nwl/
    /// - Windows: %APPDATA%/nwl/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nwl")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
