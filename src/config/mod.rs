//! 补丁配置
pub mod patch;

pub use patch::{CatalogOrigin, CustomConfigBuilder, FeatureToggles, PatchConfig};
