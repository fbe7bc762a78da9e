use thiserror::Error;

/// All errors that can occur in pubscope-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Publication not found: #{0}")]
    PublicationNotFound(i64),

    #[error("Duplicated publication nickname \"{0}\"")]
    DuplicateNickname(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Library not initialized. Run 'bib init' first.")]
    LibraryNotInitialized,

    #[error("Library already exists at: {0}")]
    LibraryAlreadyExists(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Exit codes used by the `bib` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    Conflict = 7,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
