use crate::errors::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Port the callback listener binds when no redirect URI is configured
pub const DEFAULT_OAUTH_PORT: u16 = 65010;

/// Reddit application credentials.
///
/// The stored code and refresh token are read through
/// [`crate::credential_store::CredentialStore`], not here.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default, deserialize_with = "crate::models::deserialize_secret_option")]
    pub client_secret: Option<SecretString>,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_redirect_uri() -> String {
    format!("http://localhost:{}", DEFAULT_OAUTH_PORT)
}

fn default_user_agent() -> String {
    format!("reddit-wallpaper/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: default_redirect_uri(),
            user_agent: default_user_agent(),
        }
    }
}

/// Subreddit names, either `"a, b"` or `["a", "b"]`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubredditNames {
    List(Vec<String>),
    Csv(String),
}

impl SubredditNames {
    /// Trimmed, non-empty names in configured order
    pub fn to_vec(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            SubredditNames::List(names) => names.iter().map(String::as_str).collect(),
            SubredditNames::Csv(names) => names.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubredditsConfig {
    #[serde(default)]
    pub names: Option<SubredditNames>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log to this file instead of stderr
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WallpaperConfig {
    #[serde(default = "default_wallpaper_dir")]
    pub directory: PathBuf,
}

fn default_wallpaper_dir() -> PathBuf {
    PathBuf::from("wallpapers")
}

impl Default for WallpaperConfig {
    fn default() -> Self {
        Self {
            directory: default_wallpaper_dir(),
        }
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(rename = "REDDIT", default)]
    pub reddit: RedditConfig,

    #[serde(rename = "SUBREDDITS", default)]
    pub subreddits: SubredditsConfig,

    #[serde(rename = "LOGGING", default)]
    pub logging: LoggingConfig,

    #[serde(rename = "WALLPAPER", default)]
    pub wallpaper: WallpaperConfig,
}

/// Credentials and settings checked to be present
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    pub user_agent: String,
    pub subreddits: Vec<String>,
    pub wallpaper_dir: PathBuf,
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn log_file_path(&self) -> &Option<String> {
        &self.logging.file_path
    }

    pub fn subreddit_names(&self) -> Vec<String> {
        self.subreddits
            .names
            .as_ref()
            .map(SubredditNames::to_vec)
            .unwrap_or_default()
    }

    /// Checks the required keys and returns the settings a run needs
    pub fn validate(&self) -> Result<AppSettings, ConfigError> {
        let client_id = self
            .reddit
            .client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingField {
                section: "REDDIT",
                key: "client_id",
            })?;

        let client_secret = self
            .reddit
            .client_secret
            .as_ref()
            .filter(|secret| !secret.expose_secret().trim().is_empty())
            .ok_or(ConfigError::MissingField {
                section: "REDDIT",
                key: "client_secret",
            })?;

        let subreddits = self.subreddit_names();
        if subreddits.is_empty() {
            return Err(ConfigError::MissingField {
                section: "SUBREDDITS",
                key: "names",
            });
        }

        Ok(AppSettings {
            client_id: client_id.to_string(),
            client_secret: client_secret.clone(),
            redirect_uri: self.reddit.redirect_uri.clone(),
            user_agent: self.reddit.user_agent.clone(),
            subreddits,
            wallpaper_dir: self.wallpaper.directory.clone(),
        })
    }
}

/// Default config location: `config.toml` in the working directory
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

/// Reads and parses the config file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Config::from_toml_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
[AUTH]
code = "stored-code"

[REDDIT]
client_id = "abc"
client_secret = "shh"
redirect_uri = "http://localhost:8123"
refresh_token = "refresh"

[SUBREDDITS]
names = "wallpapers, EarthPorn ,, spaceporn"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(FULL_CONFIG).unwrap();

        assert_eq!(config.reddit.client_id.as_deref(), Some("abc"));
        assert_eq!(config.reddit.redirect_uri, "http://localhost:8123");
        assert_eq!(
            config.subreddit_names(),
            vec!["wallpapers", "EarthPorn", "spaceporn"]
        );
    }

    #[test]
    fn test_defaults_when_sections_are_absent() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config.reddit.redirect_uri, "http://localhost:65010");
        assert!(config.reddit.user_agent.starts_with("reddit-wallpaper/"));
        assert_eq!(config.log_level(), "info");
        assert!(config.log_file_path().is_none());
        assert_eq!(config.wallpaper.directory, PathBuf::from("wallpapers"));
    }

    #[test]
    fn test_subreddit_names_as_array() {
        let config = Config::from_toml_str(
            r#"
[SUBREDDITS]
names = [" wallpapers ", "", "earthporn"]
"#,
        )
        .unwrap();
        assert_eq!(config.subreddit_names(), vec!["wallpapers", "earthporn"]);
    }

    #[test]
    fn test_validate_success() {
        let settings = Config::from_toml_str(FULL_CONFIG)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(settings.client_id, "abc");
        assert_eq!(settings.client_secret.expose_secret(), "shh");
        assert_eq!(settings.subreddits.len(), 3);
    }

    #[test]
    fn test_validate_missing_client_id() {
        let config = Config::from_toml_str(
            r#"
[REDDIT]
client_secret = "shh"
[SUBREDDITS]
names = "wallpapers"
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                section: "REDDIT",
                key: "client_id"
            }
        ));
    }

    #[test]
    fn test_validate_missing_client_secret() {
        let config = Config::from_toml_str(
            r#"
[REDDIT]
client_id = "abc"
client_secret = "  "
[SUBREDDITS]
names = "wallpapers"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::MissingField {
                key: "client_secret",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_missing_subreddits() {
        let config = Config::from_toml_str(
            r#"
[REDDIT]
client_id = "abc"
client_secret = "shh"
[SUBREDDITS]
names = " , "
"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::MissingField {
                section: "SUBREDDITS",
                key: "names"
            }
        ));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[REDDIT\nclient_id = ").unwrap();
        assert!(matches!(
            load_config(&path).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
    }
}
