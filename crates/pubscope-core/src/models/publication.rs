use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form bibliographic fields (`journal`, `pages`, `issn`, ...).
///
/// Two keys are reserved: `_type` holds the citation type ("article",
/// "inproceedings", ...) and `_ident` the citation key. `_ident` never reaches
/// the store.
pub type RefData = Map<String, Value>;

pub const REFDATA_TYPE_KEY: &str = "_type";
pub const REFDATA_IDENT_KEY: &str = "_ident";

/// A stored publication row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bibcode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// `false` while a record is pending review (e.g. right after autolearning).
    pub keep: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfas: Option<String>,

    #[serde(default)]
    pub refdata: RefData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl Publication {
    /// Citation type from the refdata, if recorded.
    pub fn ref_type(&self) -> Option<&str> {
        self.refdata.get(REFDATA_TYPE_KEY).and_then(Value::as_str)
    }
}

/// The canonical intermediate form of a publication.
///
/// Every source parser produces one of these; the store creates or rewrites
/// rows from it, and `export_record` turns a stored row back into one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bibcode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arxiv: Option<String>,

    pub keep: bool,

    /// Storage-encoded names, in order.
    pub authors: Vec<String>,

    /// Storage-encoded names, in order.
    pub editors: Vec<String>,

    pub nicknames: Vec<String>,

    pub refdata: RefData,
}

impl PubRecord {
    /// An empty record as produced by autolearning: not yet curated.
    pub fn pending() -> Self {
        Self {
            keep: false,
            ..Self::default()
        }
    }

    pub fn set_ref_type(&mut self, kind: &str) {
        self.refdata
            .insert(REFDATA_TYPE_KEY.to_string(), Value::String(kind.to_string()));
    }
}
