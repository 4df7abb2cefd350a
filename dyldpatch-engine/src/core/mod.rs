mod enums;
mod version;
mod rule;
mod result;

// 导出常用项
pub use enums::FeatureTag;
pub use version::{OsVersion, VersionRange};
pub use rule::{PatternRule, RuleScope, ANY_TARGET};
pub use result::{MatchRecord, PatchResult, PatchStatus};
