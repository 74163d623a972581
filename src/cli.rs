//! Command-line surface of the `tokenview` binary.
//! `tokenview` 命令行参数。

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tv_core::settings::ViewportSettings;
use tv_core::{SortDirection, ViewKey, Viewport};

use crate::bootstrap::ProviderSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortDirection {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Asc => SortDirection::Asc,
            SortArg::Desc => SortDirection::Desc,
        }
    }
}

/// Load one view of a token collection and print its first render window
/// as JSON.
#[derive(Debug, Parser)]
#[command(name = "tokenview", version, about)]
pub struct Cli {
    /// Settings file; falls back to `TOKENVIEW_CONFIG`, then to defaults.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Collection contract address.
    #[arg(long)]
    pub contract: String,

    #[arg(long, default_value_t = 1)]
    pub chain: u64,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub sort_by: Option<String>,

    #[arg(long, value_enum, default_value_t = SortArg::Asc)]
    pub sort_direction: SortArg,

    /// Attribute filter as `Trait=Value`; repeat for more values.
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Scroll offset of the viewport in pixels.
    #[arg(long, default_value_t = 0.0)]
    pub scroll: f64,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 1080.0)]
    pub height: f64,

    /// Serve a synthetic collection of this many tokens instead of calling
    /// the configured provider.
    #[arg(long, value_name = "RECORDS")]
    pub demo: Option<usize>,

    #[arg(long)]
    pub pretty: bool,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((trait_type, value)) if !trait_type.trim().is_empty() && !value.trim().is_empty() => {
            Ok((trait_type.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected Trait=Value, got {raw:?}")),
    }
}

impl Cli {
    pub fn view_key(&self) -> ViewKey {
        let mut key = ViewKey::new(&self.contract, self.chain);
        if let Some(field) = &self.sort_by {
            key = key.with_sort(field, self.sort_direction.into());
        }
        if let Some(query) = &self.search {
            key = key.with_search(query);
        }
        for (trait_type, value) in &self.filters {
            key = key.with_filter(trait_type, value);
        }
        key
    }

    pub fn viewport(&self, settings: &ViewportSettings) -> Viewport {
        Viewport::new(
            self.height,
            settings.column_count,
            settings.row_height_estimate,
            settings.overscan,
        )
        .scrolled_to(self.scroll)
    }

    pub fn provider_source(&self) -> ProviderSource {
        match self.demo {
            Some(records) => ProviderSource::Demo { records },
            None => ProviderSource::Http,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_and_sort_build_normalized_key() {
        let cli = Cli::parse_from([
            "tokenview",
            "--contract",
            "0xABC",
            "--chain",
            "137",
            "--sort-by",
            "token_id",
            "--sort-direction",
            "desc",
            "--filter",
            "Eyes=Laser",
            "--filter",
            "Background=Gold",
        ]);
        let expected = ViewKey::new("0xabc", 137u64)
            .with_sort("token_id", SortDirection::Desc)
            .with_filter("Background", "Gold")
            .with_filter("Eyes", "Laser");
        assert_eq!(cli.view_key(), expected);
        assert_eq!(cli.provider_source(), ProviderSource::Http);
    }

    #[test]
    fn test_malformed_filter_is_rejected() {
        let result = Cli::try_parse_from(["tokenview", "--contract", "0x1", "--filter", "Eyes"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_demo_flag_selects_in_memory_provider() {
        let cli = Cli::parse_from(["tokenview", "--contract", "0x1", "--demo", "500"]);
        assert_eq!(cli.provider_source(), ProviderSource::Demo { records: 500 });
        let vp = cli.viewport(&ViewportSettings::default());
        assert_eq!(vp.viewport_height, 1080.0);
        assert_eq!(vp.column_count, 4);
    }
}
