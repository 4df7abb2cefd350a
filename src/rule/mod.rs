//! 规则目录加载
pub mod loader;

pub use loader::CatalogLoader;
