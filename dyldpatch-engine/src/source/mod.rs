// 声明式规则表（JSON）定义与目录构建
pub mod definition;

pub use definition::{ByteSpec, CatalogDefinition, RuleDefinition, RuleSetDefinition};
