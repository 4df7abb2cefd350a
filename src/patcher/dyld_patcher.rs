//! 补丁器门面
//! 核心职责：
//! 1. 规则目录加载（内置/本地规则表）
//! 2. 按功能开关过滤规则集，对调用方镜像执行补丁会话
//! 3. 提供字节切片/字符串版本号/只扫描等多版本接口

use dyldpatch_engine::{
    ImageBuffer, MatchRecord, OsVersion, PatchSession, RuleCatalog, RuleSet, RuleSetResolver,
    SessionReport,
};
use std::sync::Arc;

use crate::error::DyldResult;
use crate::rule::CatalogLoader;
use crate::PatchConfig;

/// 补丁器
/// - catalog: 已校验的规则目录（Arc共享，只读）
/// - config: 补丁配置（功能开关/输出级别）
#[derive(Debug, Clone)]
pub struct DyldPatcher {
    catalog: Arc<RuleCatalog>,
    config: PatchConfig,
}

impl DyldPatcher {
    /// 按配置加载规则目录并创建补丁器
    pub fn new(config: PatchConfig) -> DyldResult<Self> {
        let catalog = CatalogLoader::new().load(&config)?;
        Ok(Self::with_catalog(catalog, config))
    }

    /// 使用已加载的规则目录创建补丁器
    pub fn with_catalog(catalog: Arc<RuleCatalog>, config: PatchConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &Arc<RuleCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// 当前配置下适用于目标镜像的规则集
    pub fn rule_sets_for(&self, target_name: &str, os_version: &OsVersion) -> Vec<&RuleSet> {
        RuleSetResolver::new(&self.catalog)
            .with_features(self.config.features_for(target_name))
            .resolve(target_name, os_version)
    }

    /// 对镜像执行一次补丁会话
    /// 写入被拒绝记录在报告中（PartiallyApplied），不作为错误返回
    pub fn patch_image<B: ImageBuffer + ?Sized>(
        &self,
        target_name: &str,
        os_version: OsVersion,
        image: &mut B,
    ) -> DyldResult<SessionReport> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "patch_session",
            target = %target_name,
            os_version = %os_version
        )
        .entered();

        let report = PatchSession::new(&self.catalog, target_name, os_version)
            .with_features(self.config.features_for(target_name))
            .run(image)?;

        if self.config.verbose {
            for result in &report.results {
                log::info!("{}", result);
            }
        }
        log::debug!(
            "Patched [{}] on {}: {} ({} occurrence(s))",
            report.target,
            report.os_version,
            report.outcome,
            report.patched_occurrences()
        );
        Ok(report)
    }

    /// 字节切片 + 字符串版本号（如 "12.3 (21E5206e)"）
    pub fn patch_bytes(
        &self,
        target_name: &str,
        os_version: &str,
        bytes: &mut [u8],
    ) -> DyldResult<SessionReport> {
        let version = OsVersion::parse(os_version)?;
        self.patch_image(target_name, version, bytes)
    }

    /// 只扫描不写入
    pub fn scan_image(
        &self,
        target_name: &str,
        os_version: OsVersion,
        image: &[u8],
    ) -> Vec<MatchRecord> {
        PatchSession::new(&self.catalog, target_name, os_version)
            .with_features(self.config.features_for(target_name))
            .scan_only(image)
    }
}
