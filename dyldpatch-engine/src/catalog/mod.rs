mod rule_set;
mod library;
mod builder;

// 对外只导出具体内容，不导出模块名
pub use rule_set::RuleSet;
pub use library::RuleCatalog;
pub use builder::RuleCatalogBuilder;
