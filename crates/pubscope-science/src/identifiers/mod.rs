pub mod classify;
mod url;

pub use classify::{RefKind, classify};
pub use url::sniff_url;
