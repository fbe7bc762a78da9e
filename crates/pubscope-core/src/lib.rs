pub mod config;
pub mod error;
pub mod models;
pub mod names;
pub mod storage;

pub use config::AppConfig;
pub use error::{CoreError, ExitCode, Result};
pub use models::*;

pub use storage::database::{ConnectionPool, Database, open_database, open_in_memory};
pub use storage::init::{init_library, open_library};
pub use storage::{ExactIdField, RecordStore};
