use dyldpatch_engine::{CatalogDefinition, RuleCatalog};
use std::path::Path;
use std::sync::Arc;

use crate::error::{DyldPatchError, DyldResult};
use crate::{CatalogOrigin, PatchConfig};

/// 规则目录加载器：内置规则表 / 本地 JSON 规则表
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogLoader;

impl CatalogLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, config: &PatchConfig) -> DyldResult<Arc<RuleCatalog>> {
        match &config.origin {
            CatalogOrigin::Embedded => self.load_embedded(),
            CatalogOrigin::LocalFile(path) => self.load_from_file(path).map(Arc::new),
        }
    }

    #[cfg(feature = "embedded-rules")]
    fn load_embedded(&self) -> DyldResult<Arc<RuleCatalog>> {
        crate::dyldpatch_rules::embedded_catalog()
    }

    #[cfg(not(feature = "embedded-rules"))]
    fn load_embedded(&self) -> DyldResult<Arc<RuleCatalog>> {
        Err(DyldPatchError::FeatureDisabled(
            "embedded-rules feature is disabled, cannot use embedded rule table. Please enable this feature or use a local rule file.".to_string(),
        ))
    }

    /// 读取并校验本地规则表
    pub fn load_from_file(&self, path: &Path) -> DyldResult<RuleCatalog> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DyldPatchError::RuleLoadError(format!("读取本地规则表[{}]失败: {}", path.display(), e))
        })?;
        let catalog = Self::parse(&content)?;
        log::info!(
            "Loaded rule catalog from {}: {} rule set(s), {} rule(s)",
            path.display(),
            catalog.len(),
            catalog.rule_count()
        );
        Ok(catalog)
    }

    /// 解析 JSON 规则表并构建目录（含 VerifyGate 校验）
    pub fn parse(json: &str) -> DyldResult<RuleCatalog> {
        let definition = CatalogDefinition::from_json(json)?;
        Ok(definition.build()?)
    }
}
