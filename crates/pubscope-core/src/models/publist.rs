use serde::{Deserialize, Serialize};

/// Name of the list that always mirrors the most recently printed listing.
pub const RESERVED_LISTING: &str = "last_listing";

/// Prefix applied to user-defined list names so they cannot collide with
/// [`RESERVED_LISTING`].
pub const USER_LIST_PREFIX: &str = "user_";

/// One slot of a named list. Positions are dense per list name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub name: String,
    pub position: usize,
    pub pub_id: i64,
}

/// Storage name of a user list.
pub fn user_list_name(name: &str) -> String {
    format!("{USER_LIST_PREFIX}{name}")
}
