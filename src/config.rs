//! Optional TOML config file for the CLI.
//!
//! Flags always win; the file only supplies defaults. Looked up at the path
//! given by `--config`, falling back to `livelist.toml` in the working
//! directory when present.

use std::path::Path;

use serde::Deserialize;

use crate::error::LiveListError;

pub const DEFAULT_CONFIG_FILE: &str = "livelist.toml";

/// File-supplied defaults. All fields optional; absent fields fall back to
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub page_size: Option<u32>,
    pub project: Option<String>,
    pub reconnect_secs: Option<u64>,
}

impl FileConfig {
    /// Load and parse `path`.
    pub fn load(path: &Path) -> Result<FileConfig, LiveListError> {
        let text = std::fs::read_to_string(path).map_err(|e| LiveListError::Config {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| LiveListError::Config {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// Load `path` when given, else `livelist.toml` when it exists, else
    /// empty defaults. An explicitly given path that fails to load is an
    /// error; a missing fallback file is not.
    pub fn load_or_default(path: Option<&Path>) -> Result<FileConfig, LiveListError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(FileConfig::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
base_url = "http://console.internal:8080"
page_size = 50
project = "alpha"
reconnect_secs = 5
"#,
        );
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://console.internal:8080"));
        assert_eq!(config.page_size, Some(50));
        assert_eq!(config.project.as_deref(), Some("alpha"));
        assert_eq!(config.reconnect_secs, Some(5));
    }

    #[test]
    fn test_load_partial_config() {
        let file = write_config("base_url = \"http://localhost:9000\"\n");
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
        assert!(config.page_size.is_none());
    }

    #[test]
    fn test_load_empty_file_is_all_defaults() {
        let file = write_config("");
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = FileConfig::load(Path::new("/nonexistent/livelist.toml")).unwrap_err();
        assert!(matches!(err, LiveListError::Config { .. }), "{err}");
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let file = write_config("base_url = [not toml");
        assert!(FileConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_without_path_or_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let prev = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let config = FileConfig::load_or_default(None).unwrap();
        std::env::set_current_dir(prev).unwrap();
        assert_eq!(config, FileConfig::default());
    }
}
