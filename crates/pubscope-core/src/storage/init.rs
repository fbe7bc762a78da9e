use std::path::Path;

use crate::error::{CoreError, Result};
use crate::storage::database::Database;

/// Create the library directory and a fresh database inside it.
///
/// # Errors
///
/// Returns an error if a database file already exists at `db_path`, or if
/// filesystem or database operations fail.
pub fn init_library(db_path: &Path) -> Result<Database> {
    if db_path.exists() {
        return Err(CoreError::LibraryAlreadyExists(
            db_path.display().to_string(),
        ));
    }

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Database::open(db_path)
}

/// Open the database of an already initialized library.
pub fn open_library(db_path: &Path) -> Result<Database> {
    if !db_path.exists() {
        return Err(CoreError::LibraryNotInitialized);
    }
    Database::open(db_path)
}
