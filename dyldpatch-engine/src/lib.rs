// 核心公共结构体+枚举（规则/版本/结果）
pub mod core;
// 内核错误定义
pub mod error;
// 规则集 + 规则目录 + 构建器
pub mod catalog;
// 加载期不变量校验
pub mod verify;
// 字节模式扫描
pub mod matcher;
// 可写镜像抽象
pub mod image;
// 原地补丁应用
pub mod applier;
// 按目标/系统版本选择规则集
pub mod resolver;
// 单次补丁会话
pub mod session;
// 会话统计
pub mod stats;
// 声明式规则表解析
pub mod source;
// 日志格式化工具
pub mod utils;

// 顶层导出常用类型
pub use applier::PatchApplier;
pub use catalog::{RuleCatalog, RuleCatalogBuilder, RuleSet};
pub use core::{
    FeatureTag, MatchRecord, OsVersion, PatchResult, PatchStatus, PatternRule, RuleScope, ANY_TARGET,
    VersionRange,
};
pub use error::{ConfigError, CoreError, CoreResult};
pub use image::{ImageBuffer, PagedImage};
pub use matcher::PatternMatcher;
pub use resolver::RuleSetResolver;
pub use session::{PatchSession, SessionOutcome, SessionReport, SessionState};
pub use source::{ByteSpec, CatalogDefinition, RuleDefinition, RuleSetDefinition};
pub use stats::SessionStats;
pub use verify::VerifyGate;
