use super::WallpaperSetter;
use crate::errors::FetchError;
use crate::models::CandidatePost;
use chrono::{DateTime, Local};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// What happened to a selected post
#[derive(Debug, PartialEq)]
pub enum ApplyOutcome {
    /// Downloaded and handed to the setter successfully
    Applied(PathBuf),
    /// Downloaded, but the setter reported failure
    SetterFailed(PathBuf),
    /// Download failed; the setter was not called
    DownloadFailed,
}

/// `wallpaper<DDMMYYYY_HHMMSS>.<ext>`, ext taken from the image URL
pub fn wallpaper_file_name(url: &str, at: DateTime<Local>) -> String {
    let extension = url::Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
        })
        .filter(|e| matches!(e.as_str(), "jpg" | "jpeg" | "png"))
        .unwrap_or_else(|| "jpg".to_string());

    format!("wallpaper{}.{}", at.format("%d%m%Y_%H%M%S"), extension)
}

/// Streams `url` into `dest`
pub async fn download_image(http: &Client, url: &str, dest: &Path) -> Result<PathBuf, FetchError> {
    let mut response = http.get(url).send().await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(FetchError::BadStatus {
            status: status.as_u16(),
        });
    }

    let write_error = |e: std::io::Error| FetchError::WriteError {
        path: dest.display().to_string(),
        source: e,
    };

    let mut file = File::create(dest).await.map_err(write_error)?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await.map_err(write_error)?;
    }
    file.flush().await.map_err(write_error)?;

    tracing::info!("Image downloaded successfully to {:?}", dest);
    Ok(dest.to_path_buf())
}

/// Downloads the post into `dir` and sets it as wallpaper.
///
/// Failures are logged; the setter only runs after a successful download.
pub async fn fetch_and_apply(
    http: &Client,
    post: &CandidatePost,
    dir: &Path,
    setter: &dyn WallpaperSetter,
    at: DateTime<Local>,
) -> ApplyOutcome {
    let dest = dir.join(wallpaper_file_name(&post.url, at));

    let path = match download_image(http, &post.url, &dest).await {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("Failed to download {}: {}", post.url, e);
            // Drop a partial file so it is never mistaken for a wallpaper
            let _ = tokio::fs::remove_file(&dest).await;
            return ApplyOutcome::DownloadFailed;
        }
    };

    let absolute = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
    match setter.set_wallpaper(&absolute) {
        Ok(()) => {
            tracing::info!("Wallpaper set successfully on {}", setter.name());
            ApplyOutcome::Applied(absolute)
        }
        Err(e) => {
            tracing::error!("Failed to set wallpaper on {}: {}", setter.name(), e);
            ApplyOutcome::SetterFailed(absolute)
        }
    }
}
