use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/pubscope/config.toml`.
///
/// The same file carries a `[science]` table that `pubscope-science` reads on
/// its own; unknown tables are ignored here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub library_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// `"year"` sorts listings by year, `"none"` keeps resolution order.
    pub sort: String,
    pub title_width: usize,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("pubscope");

        Self {
            library_path: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            sort: "year".to_string(),
            title_width: 80,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/pubscope/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PUBSCOPE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("pubscope")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    ///
    /// `PUBSCOPE_LIBRARY_PATH` wins over the file's `library_path`.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut config = Self::load_from(&path)?;
        if let Ok(library_path) = std::env::var("PUBSCOPE_LIBRARY_PATH") {
            config.set_library_path(PathBuf::from(library_path));
        }
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn set_library_path(&mut self, path: PathBuf) {
        self.core.library_path = path.to_string_lossy().to_string();
    }

    // ─── Derived paths ─────────────────────────────────────

    pub fn library_dir(&self) -> PathBuf {
        PathBuf::from(&self.core.library_path)
    }

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.library_dir().join("db.sqlite3")
    }

    pub fn sort_by_year(&self) -> bool {
        self.listing.sort != "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.listing.sort, "year");
        assert_eq!(cfg.listing.title_width, 80);
        assert!(!cfg.core.library_path.is_empty());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.listing.title_width = 60;
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.listing.title_width, 60);
        assert_eq!(loaded.core.library_path, cfg.core.library_path);
    }

    #[test]
    fn test_unknown_tables_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[core]\nlibrary_path = \"/tmp/bib\"\n\n[science]\nads_api_key = \"abc\"\n",
        )
        .unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.database_path(), PathBuf::from("/tmp/bib/db.sqlite3"));
        assert!(loaded.sort_by_year());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = AppConfig::load_from(Path::new("/tmp/nonexistent_pubscope_config.toml")).unwrap();
        assert_eq!(cfg.listing.sort, "year");
    }
}
