//! Settings profile loaded from a TOML file.
//!
//! The profile controls login behaviour, the download destination, the
//! concurrency limit and the live-view geometry. A missing file is not an
//! error at this layer; callers decide whether to fall back to defaults.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Default settings file name, resolved relative to the user's home directory.
pub const DEFAULT_SETTINGS_FILE: &str = ".podhoard.toml";

/// Errors that can occur while loading a settings profile.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("could not read settings file {path}: {source}")]
    Io {
        /// The path that failed to load.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has a wrong-typed value.
    #[error("could not parse settings file {path}: {source}")]
    Parse {
        /// The path that failed to parse.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The `exclude` value is not a valid regular expression.
    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidExclude {
        /// The pattern as written in the settings file.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },
}

impl SettingsError {
    /// Returns true when the error is a missing settings file, which callers
    /// treat as "use defaults" rather than a fatal condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// A settings profile for a download run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Use the stored credentials instead of prompting.
    #[serde(default)]
    pub auto_login: bool,
    /// Username for auto-login.
    #[serde(default)]
    pub username: String,
    /// Password for auto-login.
    #[serde(default)]
    pub password: String,
    /// Base directory podcasts are saved under, one subdirectory per course.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    /// Number of podcasts downloaded simultaneously.
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
    /// Display width of download progress bars, in cells.
    #[serde(default = "default_progress_bar_size")]
    pub progress_bar_size: usize,
    /// Case-sensitive regex matched against the start of course names;
    /// matching courses are skipped entirely. Empty disables the filter.
    #[serde(default)]
    pub exclude: String,
    /// URL of the portal login service.
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Base URL of the video portal.
    #[serde(default = "default_portal_url")]
    pub portal_url: String,
}

fn default_base_dir() -> String {
    "~/Lectures".to_string()
}

fn default_concurrent_downloads() -> usize {
    4
}

fn default_progress_bar_size() -> usize {
    30
}

fn default_login_url() -> String {
    "https://login.manchester.ac.uk/cas/login".to_string()
}

fn default_portal_url() -> String {
    "https://video.manchester.ac.uk".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_login: false,
            username: String::new(),
            password: String::new(),
            base_dir: default_base_dir(),
            concurrent_downloads: default_concurrent_downloads(),
            progress_bar_size: default_progress_bar_size(),
            exclude: String::new(),
            login_url: default_login_url(),
            portal_url: default_portal_url(),
        }
    }
}

impl Settings {
    /// Loads a settings profile from the given TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] if the file cannot be read and
    /// [`SettingsError::Parse`] if it is not valid TOML or a value has the
    /// wrong type.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Compiles the exclude pattern, or `None` when the filter is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidExclude`] for an unparseable pattern.
    pub fn exclude_pattern(&self) -> Result<Option<Regex>, SettingsError> {
        if self.exclude.is_empty() {
            return Ok(None);
        }
        Regex::new(&self.exclude)
            .map(Some)
            .map_err(|source| SettingsError::InvalidExclude {
                pattern: self.exclude.clone(),
                source,
            })
    }

    /// Resolves the base directory, expanding a leading `~` against `home`.
    #[must_use]
    pub fn resolved_base_dir(&self, home: &Path) -> PathBuf {
        expand_home(&self.base_dir, home)
    }
}

/// Expands a leading `~/` (or bare `~`) path component against `home`.
#[must_use]
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write_settings(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_full_profile() {
        let (_dir, path) = write_settings(
            r#"
auto_login = true
username = "mabcdefg"
password = "hunter2"
base_dir = "/data/lectures"
concurrent_downloads = 8
progress_bar_size = 20
exclude = "ACME"
login_url = "https://login.example.edu/cas/login"
portal_url = "https://video.example.edu"
"#,
        );

        let settings = Settings::load(&path).unwrap();
        assert!(settings.auto_login);
        assert_eq!(settings.username, "mabcdefg");
        assert_eq!(settings.concurrent_downloads, 8);
        assert_eq!(settings.progress_bar_size, 20);
        assert_eq!(settings.exclude, "ACME");
        assert_eq!(settings.portal_url, "https://video.example.edu");
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let (_dir, path) = write_settings("");
        let settings = Settings::load(&path).unwrap();
        assert!(!settings.auto_login);
        assert_eq!(settings.base_dir, "~/Lectures");
        assert_eq!(settings.concurrent_downloads, 4);
        assert_eq!(settings.progress_bar_size, 30);
        assert!(settings.exclude.is_empty());
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Settings::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_wrong_type_is_parse_error() {
        let (_dir, path) = write_settings("concurrent_downloads = \"four\"\n");
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_load_unknown_key_is_parse_error() {
        let (_dir, path) = write_settings("concurent_downloads = 4\n");
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_exclude_pattern_empty_disables_filter() {
        let settings = Settings::default();
        assert!(settings.exclude_pattern().unwrap().is_none());
    }

    #[test]
    fn test_exclude_pattern_invalid_regex() {
        let settings = Settings {
            exclude: "COMP[".to_string(),
            ..Settings::default()
        };
        let err = settings.exclude_pattern().unwrap_err();
        assert!(matches!(err, SettingsError::InvalidExclude { .. }));
        assert!(err.to_string().contains("COMP["));
    }

    #[test]
    fn test_expand_home_tilde_prefix() {
        let home = Path::new("/home/student");
        assert_eq!(
            expand_home("~/Lectures", home),
            PathBuf::from("/home/student/Lectures")
        );
        assert_eq!(expand_home("~", home), PathBuf::from("/home/student"));
        assert_eq!(expand_home("/abs/path", home), PathBuf::from("/abs/path"));
    }
}
