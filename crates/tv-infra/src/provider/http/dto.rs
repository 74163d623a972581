//! Wire types of the collection API and their mapping into domain types.
//! 集合 API 的线上数据结构及其到领域类型的映射。

use serde::{Deserialize, Serialize};
use tv_core::{Attribute, ChainId, IndexingPhase, IndexingStatus, RawPage, Record};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensResponseDto {
    #[serde(default)]
    pub items: Vec<TokenDto>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDto {
    #[serde(default)]
    pub id: Option<String>,
    pub token_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub attributes: Vec<AttributeDto>,
}

/// Trait values arrive as strings, numbers or booleans depending on the
/// collection's metadata; all of them are rendered as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDto {
    pub trait_type: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingDto {
    pub status: IndexingPhase,
    #[serde(default)]
    pub progress: f64,
}

impl TokensResponseDto {
    pub fn into_raw_page(self, contract_address: &str, chain: ChainId) -> RawPage {
        RawPage {
            items: self
                .items
                .into_iter()
                .map(|token| token.into_record(contract_address, chain))
                .collect(),
            total_count: self.total_count,
            next_cursor: self.next_cursor.filter(|c| !c.is_empty()),
        }
    }
}

impl TokenDto {
    pub fn into_record(self, contract_address: &str, chain: ChainId) -> Record {
        let chain = self.chain_id.map(ChainId).unwrap_or(chain);
        Record {
            id: self
                .id
                .unwrap_or_else(|| format!("{contract_address}:{}", self.token_id)),
            name: self
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("#{}", self.token_id)),
            token_id: self.token_id,
            description: self.description,
            image_url: self.image_url,
            chain,
            attributes: self
                .attributes
                .into_iter()
                .map(AttributeDto::into_attribute)
                .collect(),
            is_placeholder: false,
        }
    }
}

impl AttributeDto {
    pub fn into_attribute(self) -> Attribute {
        let value = match self.value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        Attribute::new(self.trait_type, value)
    }
}

impl From<IndexingDto> for IndexingStatus {
    fn from(dto: IndexingDto) -> Self {
        let progress = if dto.progress.is_finite() {
            dto.progress.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };
        match dto.status {
            IndexingPhase::Completed => IndexingStatus::completed(),
            IndexingPhase::InProgress => IndexingStatus::in_progress(progress),
            IndexingPhase::NotStarted => IndexingStatus::not_started(),
        }
    }
}
