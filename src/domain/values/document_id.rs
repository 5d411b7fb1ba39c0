use serde::{Deserialize, Serialize};
use std::fmt;

/// External document identifier.
///
/// Integer and string ids are different keys: `Int(1)` and `Str("1")` name two
/// distinct documents and must never be normalized into one another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    Str(String),
}

impl DocumentId {
    /// Rough payload size used when sizing insert batches.
    pub fn byte_size(&self) -> usize {
        match self {
            DocumentId::Int(_) => std::mem::size_of::<i64>(),
            DocumentId::Str(s) => s.len(),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Int(i) => write!(f, "{i}"),
            DocumentId::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(v: i64) -> Self {
        DocumentId::Int(v)
    }
}

impl From<i32> for DocumentId {
    fn from(v: i32) -> Self {
        DocumentId::Int(v as i64)
    }
}

impl From<&str> for DocumentId {
    fn from(v: &str) -> Self {
        DocumentId::Str(v.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(v: String) -> Self {
        DocumentId::Str(v)
    }
}
