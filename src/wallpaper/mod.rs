//! Platform wallpaper setters and the download-then-apply step.

mod fetch;

pub use fetch::{ApplyOutcome, download_image, fetch_and_apply, wallpaper_file_name};

use crate::errors::WallpaperError;
use std::path::Path;
use std::process::Command;

/// Sets an image file as the desktop background
pub trait WallpaperSetter: Send + Sync {
    fn name(&self) -> &'static str;

    fn set_wallpaper(&self, image_path: &Path) -> Result<(), WallpaperError>;
}

/// `SystemParametersInfoW(SPI_SETDESKWALLPAPER)`
pub struct WindowsSetter;

/// `feh --bg-scale`
pub struct FehSetter;

/// Finder via AppleScript
pub struct MacOsSetter;

/// Logs and does nothing
pub struct UnsupportedSetter {
    os: String,
}

/// Picks the setter for an OS name as reported by `std::env::consts::OS`
pub fn setter_for_os(os: &str) -> Box<dyn WallpaperSetter> {
    match os {
        "windows" => Box::new(WindowsSetter),
        "linux" => Box::new(FehSetter),
        "macos" => Box::new(MacOsSetter),
        other => Box::new(UnsupportedSetter {
            os: other.to_string(),
        }),
    }
}

/// Setter for the running platform
pub fn platform_setter() -> Box<dyn WallpaperSetter> {
    setter_for_os(std::env::consts::OS)
}

fn run_command(program: &'static str, command: &mut Command) -> Result<(), WallpaperError> {
    let status = command
        .status()
        .map_err(|e| WallpaperError::SpawnError { program, source: e })?;
    if status.success() {
        Ok(())
    } else {
        Err(WallpaperError::CommandFailed { program, status })
    }
}

fn path_str(path: &Path) -> Result<&str, WallpaperError> {
    path.to_str().ok_or_else(|| WallpaperError::InvalidPath {
        path: path.display().to_string(),
    })
}

impl WallpaperSetter for FehSetter {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn set_wallpaper(&self, image_path: &Path) -> Result<(), WallpaperError> {
        run_command("feh", Command::new("feh").arg("--bg-scale").arg(image_path))
    }
}

/// AppleScript that points Finder's desktop picture at `path`
pub fn applescript_for(path: &str) -> String {
    let escaped = path.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        "tell application \"Finder\" to set desktop picture to POSIX file \"{}\"",
        escaped
    )
}

impl WallpaperSetter for MacOsSetter {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn set_wallpaper(&self, image_path: &Path) -> Result<(), WallpaperError> {
        let script = applescript_for(path_str(image_path)?);
        run_command("osascript", Command::new("osascript").arg("-e").arg(script))
    }
}

impl WallpaperSetter for WindowsSetter {
    fn name(&self) -> &'static str {
        "windows"
    }

    #[cfg(target_os = "windows")]
    fn set_wallpaper(&self, image_path: &Path) -> Result<(), WallpaperError> {
        use windows::Win32::UI::WindowsAndMessaging::{
            SPI_SETDESKWALLPAPER, SPIF_SENDCHANGE, SPIF_UPDATEINIFILE, SystemParametersInfoW,
        };

        let mut path_wide: Vec<u16> = path_str(image_path)?
            .encode_utf16()
            .chain(std::iter::once(0))
            .collect();

        // SAFETY: `path_wide` is a NUL-terminated UTF-16 buffer that outlives the call.
        unsafe {
            SystemParametersInfoW(
                SPI_SETDESKWALLPAPER,
                0,
                Some(path_wide.as_mut_ptr().cast()),
                SPIF_UPDATEINIFILE | SPIF_SENDCHANGE,
            )
        }
        .map_err(|e| WallpaperError::PlatformError {
            message: e.to_string(),
        })
    }

    #[cfg(not(target_os = "windows"))]
    fn set_wallpaper(&self, _image_path: &Path) -> Result<(), WallpaperError> {
        Err(WallpaperError::Unsupported {
            os: std::env::consts::OS.to_string(),
        })
    }
}

impl WallpaperSetter for UnsupportedSetter {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn set_wallpaper(&self, image_path: &Path) -> Result<(), WallpaperError> {
        tracing::warn!(
            "Unsupported operating system ({}) for setting wallpaper, leaving {:?} in place",
            self.os,
            image_path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setter_for_os() {
        assert_eq!(setter_for_os("windows").name(), "windows");
        assert_eq!(setter_for_os("linux").name(), "linux");
        assert_eq!(setter_for_os("macos").name(), "macos");
        assert_eq!(setter_for_os("freebsd").name(), "unsupported");
    }

    #[test]
    fn test_unsupported_setter_is_a_no_op() {
        let setter = setter_for_os("haiku");
        assert!(setter.set_wallpaper(Path::new("/tmp/x.jpg")).is_ok());
    }

    #[test]
    fn test_applescript_quotes_path() {
        assert_eq!(
            applescript_for("/Users/me/wallpapers/a \"b\".jpg"),
            "tell application \"Finder\" to set desktop picture to POSIX file \"/Users/me/wallpapers/a \\\"b\\\".jpg\""
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_reports_failure() {
        let err = run_command("false", &mut Command::new("false")).unwrap_err();
        assert!(matches!(err, WallpaperError::CommandFailed { program: "false", .. }));
    }

    #[test]
    fn test_run_command_reports_missing_program() {
        let err = run_command(
            "definitely-not-installed",
            &mut Command::new("definitely-not-installed-wallpaper-tool"),
        )
        .unwrap_err();
        assert!(matches!(err, WallpaperError::SpawnError { .. }));
    }
}
