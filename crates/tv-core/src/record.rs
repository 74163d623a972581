use serde::{Deserialize, Serialize};

use crate::view::ChainId;

/// One `(trait_type, value)` pair of a token's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// A single collection entry.
/// 集合中的单条记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub token_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub chain: ChainId,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub is_placeholder: bool,
}

impl Record {
    /// Synthetic stand-in for a slot whose data has not arrived yet.
    /// Carries no attributes and is never clickable.
    pub fn placeholder(index: usize, chain: ChainId) -> Self {
        Self {
            id: format!("placeholder-{index}"),
            token_id: String::new(),
            name: String::new(),
            description: None,
            image_url: None,
            chain,
            attributes: Vec::new(),
            is_placeholder: true,
        }
    }

    pub fn is_clickable(&self) -> bool {
        !self.is_placeholder
    }

    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }
}
