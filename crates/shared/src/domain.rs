use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocId(pub i64);

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binary reviewer decision. Encoded on the wire as `1` (relevant) / `0` (irrelevant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Label {
    Relevant,
    Irrelevant,
}

#[derive(Debug, Error)]
#[error("unknown label value {0}; expected 0 or 1")]
pub struct UnknownLabel(pub u8);

impl TryFrom<u8> for Label {
    type Error = UnknownLabel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Relevant),
            0 => Ok(Self::Irrelevant),
            other => Err(UnknownLabel(other)),
        }
    }
}

impl From<Label> for u8 {
    fn from(value: Label) -> Self {
        match value {
            Label::Relevant => 1,
            Label::Irrelevant => 0,
        }
    }
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevant => "relevant",
            Self::Irrelevant => "irrelevant",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A candidate document shown to the reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub doc_id: DocId,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    /// Pre-existing label from a fully labeled exploration dataset. Display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_label: Option<Label>,
}

impl Record {
    pub fn is_exploration(&self) -> bool {
        self.debug_label.is_some()
    }
}
