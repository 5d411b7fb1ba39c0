use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A projectable document field. The id is always returned and is not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentField {
    Content,
    Metadata,
}

impl DocumentField {
    pub const ALL: [DocumentField; 2] = [DocumentField::Content, DocumentField::Metadata];
}

impl fmt::Display for DocumentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentField::Content => write!(f, "content"),
            DocumentField::Metadata => write!(f, "metadata"),
        }
    }
}

impl FromStr for DocumentField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "content" => Ok(DocumentField::Content),
            "metadata" => Ok(DocumentField::Metadata),
            _ => Err(format!("Unknown document field: {s}")),
        }
    }
}

/// Which fields a read returns alongside the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    content: bool,
    metadata: bool,
}

impl Projection {
    pub fn all() -> Self {
        Self { content: true, metadata: true }
    }

    /// `None` selects every field.
    pub fn from_include(include: Option<&[DocumentField]>) -> Self {
        match include {
            None => Self::all(),
            Some(fields) => Self {
                content: fields.contains(&DocumentField::Content),
                metadata: fields.contains(&DocumentField::Metadata),
            },
        }
    }

    pub fn content(&self) -> bool {
        self.content
    }

    pub fn metadata(&self) -> bool {
        self.metadata
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::all()
    }
}
