//! Runtime settings model.
//! 运行时设置模型。
//!
//! Every section is optional in the TOML file; missing sections and fields
//! fall back to the values in `defaults.rs`.

mod defaults;
mod model;

pub use model::*;

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
