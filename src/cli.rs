use clap::Parser;
use std::path::PathBuf;

/// Reddit Wallpaper - sets the best recent subreddit image as your desktop background
#[derive(Parser, Debug, Default)]
#[command(name = "reddit-wallpaper", version)]
#[command(about = "Picks the top image post of the last day from your subreddits and sets it as wallpaper", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory downloaded wallpapers are saved to
    #[arg(long, value_name = "DIR")]
    pub wallpaper_dir: Option<PathBuf>,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::default_config_path)
    }
}
