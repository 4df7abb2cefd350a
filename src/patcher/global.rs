//! 全局补丁器单例管理
//! 核心职责：
//! 1. 维护进程生命周期内唯一的DyldPatcher实例
//! 2. 支持按配置加载或手动注入规则目录
//! 3. 统一错误处理和状态管理

use dyldpatch_engine::RuleCatalog;
use once_cell::sync::OnceCell;
use std::sync::Arc;

use super::dyld_patcher::DyldPatcher;
use crate::error::{DyldPatchError, DyldResult};
use crate::PatchConfig;

/// 全局补丁器实例 - OnceCell确保仅初始化一次，进程内唯一
static GLOBAL_PATCHER: OnceCell<DyldPatcher> = OnceCell::new();

/// 初始化全局补丁器
/// 幂等：已初始化则直接返回Ok(())，并发初始化时仅一次生效
pub fn init_global_patcher(config: PatchConfig) -> DyldResult<()> {
    if GLOBAL_PATCHER.get().is_some() {
        log::debug!("Global patcher already initialized, skip reinitialization");
        return Ok(());
    }

    GLOBAL_PATCHER.get_or_try_init(|| {
        DyldPatcher::new(config).map_err(|e| {
            DyldPatchError::CatalogInitError(format!("Failed to create DyldPatcher instance: {}", e))
        })
    })?;

    log::info!("Global DyldPatcher initialized successfully");
    Ok(())
}

/// 手动注入规则目录，初始化全局补丁器
pub fn init_global_patcher_with_catalog(catalog: RuleCatalog, config: PatchConfig) -> DyldResult<()> {
    if GLOBAL_PATCHER.get().is_some() {
        log::debug!("Global patcher already initialized, skip reinitialization with custom catalog");
        return Ok(());
    }

    GLOBAL_PATCHER.get_or_init(|| DyldPatcher::with_catalog(Arc::new(catalog), config));

    log::info!("Global DyldPatcher initialized with custom rule catalog");
    Ok(())
}

/// 获取全局补丁器实例（无自动初始化）
pub fn global_patcher() -> DyldResult<&'static DyldPatcher> {
    GLOBAL_PATCHER.get().ok_or_else(|| {
        DyldPatchError::CatalogNotInitialized(
            "Global DyldPatcher not initialized! Please call init_global_patcher first".to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyldpatch_engine::{FeatureTag, RuleScope, VersionRange};

    #[test]
    fn test_global_init_is_idempotent() {
        let catalog = RuleCatalog::builder()
            .rule_set("nightshift", FeatureTag::NightShiftFloor, RuleScope::new(["CoreBrightness"], VersionRange::any()))
            .rule("floor", vec![9, 0, 0, 0], vec![1, 0, 0, 0])
            .build()
            .unwrap();

        init_global_patcher_with_catalog(catalog, PatchConfig::default()).unwrap();
        let first = global_patcher().unwrap();
        assert_eq!(first.catalog().rule_count(), 1);

        init_global_patcher_with_catalog(RuleCatalog::empty(), PatchConfig::default()).unwrap();
        let second = global_patcher().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(second.catalog().rule_count(), 1);
    }
}
