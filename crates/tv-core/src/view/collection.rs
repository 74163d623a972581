use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric chain identifier (EIP-155 style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A contract deployed on a chain. Indexing status is tracked per collection,
/// not per view.
/// 链上的合约集合。索引状态按集合跟踪，而不是按视图。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionId {
    contract_address: String,
    chain_id: ChainId,
}

impl CollectionId {
    /// Addresses are compared case-insensitively, so they are stored lower-cased.
    pub fn new(contract_address: impl AsRef<str>, chain_id: impl Into<ChainId>) -> Self {
        Self {
            contract_address: contract_address.as_ref().trim().to_ascii_lowercase(),
            chain_id: chain_id.into(),
        }
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.contract_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_id_normalizes_address() {
        let a = CollectionId::new("  0xABCdef ", 1u64);
        let b = CollectionId::new("0xabcdef", ChainId(1));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "1:0xabcdef");
    }

    #[test]
    fn test_collection_id_differs_by_chain() {
        assert_ne!(
            CollectionId::new("0xabc", 1u64),
            CollectionId::new("0xabc", 137u64)
        );
    }
}
