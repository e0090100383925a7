use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, SheetError};

/// Session settings. Every field has a default, so an empty config file is
/// valid.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base directory for relative workbook paths.
    pub files_dir: Option<PathBuf>,
    /// Row cap for preview reads.
    pub preview_rows: usize,
    /// Largest block, in cells, a single read may return.
    pub max_read_cells: u64,
    /// Name of the first sheet in a new workbook.
    pub default_sheet_name: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            files_dir: None,
            preview_rows: 10,
            max_read_cells: 1_000_000,
            default_sheet_name: "Sheet1".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Resolve a caller-supplied workbook path. Absolute paths are used as
    /// given; relative ones are joined onto `files_dir`.
    pub fn resolve_path(&self, path: &str) -> Result<PathBuf> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(SheetError::InvalidPath(path.to_string()));
        }
        let candidate = Path::new(trimmed);
        if candidate.is_absolute() {
            return Ok(candidate.to_path_buf());
        }
        match &self.files_dir {
            Some(dir) => Ok(dir.join(candidate)),
            None => Err(SheetError::InvalidPath(path.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.max_read_cells, 1_000_000);
        assert_eq!(config.default_sheet_name, "Sheet1");
        assert_eq!(config.files_dir, None);
    }

    #[test]
    fn test_resolve_path() {
        let mut config = Config::default();
        let absolute = std::env::temp_dir().join("book.json");
        assert_eq!(
            config.resolve_path(absolute.to_str().unwrap()).unwrap(),
            absolute
        );
        assert!(matches!(
            config.resolve_path("book.json"),
            Err(SheetError::InvalidPath(_))
        ));
        config.files_dir = Some(PathBuf::from("/data/sheets"));
        assert_eq!(
            config.resolve_path("q1/book.json").unwrap(),
            PathBuf::from("/data/sheets/q1/book.json")
        );
        assert!(config.resolve_path("  ").is_err());
    }
}
