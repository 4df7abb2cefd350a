//! 补丁模块：补丁器门面 + 全局单例
pub mod dyld_patcher;
pub mod global;

// 导出核心接口
pub use self::dyld_patcher::DyldPatcher;
pub use self::global::{global_patcher, init_global_patcher, init_global_patcher_with_catalog};
