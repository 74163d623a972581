//! Normalized identity of one filtered/sorted view of a collection.
//! 集合的某个过滤/排序视图的规范化标识。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::collection::{ChainId, CollectionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Identity of a view: contract, chain, sort, search and attribute filters.
///
/// Two keys built from the same inputs are equal regardless of the order in
/// which filters were added. Construction normalizes everything that could
/// otherwise make structurally equal views look different:
///
/// - contract address is trimmed and lower-cased
/// - search query is trimmed
/// - filter values are kept sorted and de-duplicated per trait type
/// - trait types without values are dropped
///
/// 构造时完成规范化，因此过滤条件的添加顺序不影响相等性。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewKey {
    collection: CollectionId,
    sort_field: String,
    sort_direction: SortDirection,
    search_query: String,
    attribute_filters: BTreeMap<String, BTreeSet<String>>,
}

impl ViewKey {
    /// Default view of a collection: upstream order, no search, no filters.
    pub fn new(contract_address: impl AsRef<str>, chain_id: impl Into<ChainId>) -> Self {
        Self {
            collection: CollectionId::new(contract_address, chain_id),
            sort_field: String::new(),
            sort_direction: SortDirection::Asc,
            search_query: String::new(),
            attribute_filters: BTreeMap::new(),
        }
    }

    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = field.into().trim().to_string();
        self.sort_direction = direction;
        self
    }

    pub fn with_search(mut self, query: impl AsRef<str>) -> Self {
        self.search_query = query.as_ref().trim().to_string();
        self
    }

    /// Adds one accepted value for a trait type. Blank inputs are ignored.
    pub fn with_filter(mut self, trait_type: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let trait_type = trait_type.as_ref().trim();
        let value = value.as_ref().trim();
        if trait_type.is_empty() || value.is_empty() {
            return self;
        }
        self.attribute_filters
            .entry(trait_type.to_string())
            .or_default()
            .insert(value.to_string());
        self
    }

    /// Replaces all filters from an arbitrary (unordered) map.
    pub fn with_filters<I, K, V>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.attribute_filters.clear();
        for (trait_type, values) in filters {
            for value in values {
                self = self.with_filter(trait_type.as_ref(), value.as_ref());
            }
        }
        self
    }

    pub fn collection(&self) -> &CollectionId {
        &self.collection
    }

    pub fn contract_address(&self) -> &str {
        self.collection.contract_address()
    }

    pub fn chain_id(&self) -> ChainId {
        self.collection.chain_id()
    }

    pub fn sort_field(&self) -> &str {
        &self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn attribute_filters(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.attribute_filters
    }

    pub fn has_filters(&self) -> bool {
        !self.attribute_filters.is_empty()
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection)?;
        if !self.sort_field.is_empty() {
            write!(f, " sort={}:{}", self.sort_field, self.sort_direction.as_str())?;
        }
        if !self.search_query.is_empty() {
            write!(f, " q={:?}", self.search_query)?;
        }
        if !self.attribute_filters.is_empty() {
            write!(f, " filters={}", self.attribute_filters.len())?;
        }
        Ok(())
    }
}
