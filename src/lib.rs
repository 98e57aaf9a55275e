pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod credential_store;
pub mod errors;
pub mod logger;
pub mod models;
pub mod reddit_client;
pub mod selector;
pub mod traits;
pub mod wallpaper;

pub use app::Application;
pub use auth::{AuthState, Authenticator, ListenerSettings, LoginPath, RedditOAuth, Session};
pub use config::{AppSettings, Config, load_config};
pub use credential_store::CredentialStore;
pub use errors::{AppError, AuthError, ConfigError, FetchError, RedditError, WallpaperError};
pub use models::{CandidatePost, TokenGrant};
pub use reddit_client::RedditClient;
pub use selector::choose_best_image;
pub use traits::{BrowserLauncher, PostSource, SystemBrowser, TokenExchange};
pub use wallpaper::{ApplyOutcome, WallpaperSetter, fetch_and_apply, platform_setter};
