mod dto;
mod provider;

pub use dto::{AttributeDto, IndexingDto, TokenDto, TokensResponseDto};
pub use provider::HttpCollectionProvider;
