use thiserror::Error;

/// Top-level error for a single wallpaper run
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Reddit API error: {0}")]
    Reddit(#[from] RedditError),

    #[error("Failed to prepare wallpaper directory {path}: {source}")]
    WallpaperDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create HTTP client: {source}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {source}")]
    SerializeError {
        #[source]
        source: toml::ser::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing `{key}` in config file under [{section}]")]
    MissingField {
        section: &'static str,
        key: &'static str,
    },
}

/// Errors raised while obtaining or persisting OAuth credentials
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Request error: {source}")]
    RequestError {
        #[source]
        source: reqwest::Error,
    },

    #[error("JSON parsing error: {source}")]
    JsonError {
        #[source]
        source: serde_json::Error,
    },

    #[error("OAuth error {code}: {}", .description.as_deref().unwrap_or("no description"))]
    OAuthError {
        code: String,
        description: Option<String>,
    },

    #[error("Invalid auth code: {reason}")]
    InvalidStoredCode { reason: String },

    #[error("Auth code exchange failed: {reason}")]
    CodeExchangeFailed { reason: String },

    #[error("Authorization failed after {attempts} attempts")]
    CallbackTimeout { attempts: u32 },

    #[error("Callback listener error: {source}")]
    ListenerError {
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid redirect URI {uri}: {reason}")]
    InvalidRedirectUri { uri: String, reason: String },

    #[error("Credential storage error: {0}")]
    Storage(#[from] ConfigError),

    #[error("{reason}")]
    Generic { reason: String },
}

/// Reddit listing errors
#[derive(Error, Debug)]
pub enum RedditError {
    #[error("HTTP request failed: {source}")]
    RequestError {
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to list r/{subreddit}: {status}")]
    ListingFailed { subreddit: String, status: u16 },

    #[error("Access token refresh failed: {0}")]
    TokenRefresh(#[from] AuthError),
}

/// Image download errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Download request failed: {source}")]
    RequestError {
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to download image. Status code: {status}")]
    BadStatus { status: u16 },

    #[error("Failed to write image to {path}: {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the platform wallpaper setters
#[derive(Error, Debug)]
pub enum WallpaperError {
    #[error("Failed to run {program}: {source}")]
    SpawnError {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    CommandFailed {
        program: &'static str,
        status: std::process::ExitStatus,
    },

    #[error("Unsupported operating system for setting wallpaper: {os}")]
    Unsupported { os: String },

    #[error("Wallpaper path is not valid UTF-8: {path}")]
    InvalidPath { path: String },

    #[error("Platform API call failed: {message}")]
    PlatformError { message: String },
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        AuthError::RequestError { source: error }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        AuthError::JsonError { source: error }
    }
}

impl From<reqwest::Error> for RedditError {
    fn from(error: reqwest::Error) -> Self {
        RedditError::RequestError { source: error }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::RequestError { source: error }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError { source: error }
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(error: toml::ser::Error) -> Self {
        ConfigError::SerializeError { source: error }
    }
}
