use crate::auth::{Authenticator, ListenerSettings, RedditOAuth};
use crate::cli::Cli;
use crate::config::{AppSettings, load_config};
use crate::credential_store::CredentialStore;
use crate::errors::AppError;
use crate::reddit_client::RedditClient;
use crate::selector::choose_best_image;
use crate::traits::SystemBrowser;
use crate::wallpaper::{ApplyOutcome, fetch_and_apply, platform_setter};
use chrono::{Local, Utc};
use std::path::Path;

/// Main application structure
pub struct Application;

impl Application {
    /// One pass: log in, pick the best image, download it and set it.
    ///
    /// Returns `Ok(None)` when no post qualified. Download and setter
    /// failures are logged and reported through [`ApplyOutcome`]; only
    /// configuration, authentication and setup failures are errors.
    pub async fn run(cli: Cli) -> Result<Option<ApplyOutcome>, AppError> {
        // Load config first to get log level
        let config_path = cli.config_path();
        let config = load_config(&config_path)?;

        // Keep the guard alive so file logs are flushed on exit
        let _guard = crate::logger::setup_logging(&config);
        tracing::info!("Reddit Wallpaper starting...");

        let result = match config.validate() {
            Ok(mut settings) => {
                // Command line wins over the config file
                if let Some(dir) = cli.wallpaper_dir {
                    settings.wallpaper_dir = dir;
                }
                run_once(&config_path, settings).await
            }
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(_) => tracing::info!("Reddit Wallpaper finished"),
            Err(ref e) => tracing::error!("Reddit Wallpaper failed: {}", e),
        }
        result
    }
}

async fn run_once(
    config_path: &Path,
    settings: AppSettings,
) -> Result<Option<ApplyOutcome>, AppError> {
    // Create the wallpaper directory if it doesn't exist
    std::fs::create_dir_all(&settings.wallpaper_dir).map_err(|e| AppError::WallpaperDir {
        path: settings.wallpaper_dir.display().to_string(),
        source: e,
    })?;

    // Reddit rejects requests without a descriptive user agent
    let http = reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .build()
        .map_err(|e| AppError::HttpClient { source: e })?;

    // Credentials are read from and written back to the same config file
    let oauth = RedditOAuth::new(http.clone(), &settings);
    let store = CredentialStore::new(config_path);
    let listener = ListenerSettings::from_redirect_uri(&settings.redirect_uri)?;

    // Stored refresh token, then stored code, then the browser
    let session = {
        let mut authenticator = Authenticator::new(&store, &oauth, &SystemBrowser, listener);
        let result = authenticator.authenticate().await;
        tracing::debug!("Authentication ended in state {:?}", authenticator.state());
        result?
    };
    tracing::info!("Authenticated via {:?}", session.path);

    let client = RedditClient::new(http.clone(), oauth, session);
    // A revoked refresh token surfaces here and ends the run
    let Some(post) = choose_best_image(&client, &settings.subreddits, Utc::now()).await? else {
        tracing::info!("No suitable image found in the last 24 hours");
        println!("No suitable image found.");
        return Ok(None);
    };
    tracing::info!("Best image: {} (score {})", post.url, post.score);

    // Download first; the setter only sees a complete file
    let setter = platform_setter();
    let outcome = fetch_and_apply(
        &http,
        &post,
        &settings.wallpaper_dir,
        setter.as_ref(),
        Local::now(),
    )
    .await;

    if let ApplyOutcome::Applied(ref path) = outcome {
        println!("Wallpaper set to {}", path.display());
    }
    Ok(Some(outcome))
}
