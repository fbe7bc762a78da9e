use serde::{Deserialize, Serialize};

/// Role an author reference plays on a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRole {
    Author,
    Editor,
}

impl AuthorRole {
    /// Integer code stored in the `authors.type` column.
    pub fn code(self) -> i64 {
        match self {
            Self::Author => 0,
            Self::Editor => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Author),
            1 => Some(Self::Editor),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Author => write!(f, "author"),
            Self::Editor => write!(f, "editor"),
        }
    }
}

/// One positioned author reference. Positions are dense per (publication, role).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub role: AuthorRole,
    pub position: usize,
    /// Storage-encoded name.
    pub name: String,
}
