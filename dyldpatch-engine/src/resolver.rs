//! 规则集解析
//! 只依据调用方提供的目标身份（镜像名 + 系统版本）选择规则集，从不检查镜像内容。
//! 同一功能的多个候选规则集全部返回，由匹配结果决定实际生效者。

use rustc_hash::FxHashSet;

use crate::catalog::{RuleCatalog, RuleSet};
use crate::core::{FeatureTag, OsVersion};

/// 规则集解析器（借用目录，只读）
#[derive(Debug, Clone)]
pub struct RuleSetResolver<'c> {
    catalog: &'c RuleCatalog,
    /// 启用的功能集合，None 表示不过滤
    enabled: Option<FxHashSet<FeatureTag>>,
}

impl<'c> RuleSetResolver<'c> {
    pub fn new(catalog: &'c RuleCatalog) -> Self {
        Self {
            catalog,
            enabled: None,
        }
    }

    /// 仅解析指定功能的规则集
    pub fn with_features<I>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = FeatureTag>,
    {
        self.enabled = Some(features.into_iter().collect());
        self
    }

    #[inline]
    fn is_enabled(&self, feature: FeatureTag) -> bool {
        self.enabled
            .as_ref()
            .map_or(true, |enabled| enabled.contains(&feature))
    }

    /// 目录顺序返回全部适用规则集，无候选时返回空（非错误）
    pub fn resolve(&self, target_name: &str, version: &OsVersion) -> Vec<&'c RuleSet> {
        let resolved: Vec<&'c RuleSet> = self
            .catalog
            .rule_sets()
            .iter()
            .filter(|set| self.is_enabled(set.feature()))
            .filter(|set| set.applies_to(target_name, version))
            .collect();

        if resolved.is_empty() {
            log::debug!(
                "No rule set applies to target [{}] on {}",
                target_name,
                version
            );
        } else {
            log::debug!(
                "Resolved {} rule set(s) for target [{}] on {}: {}",
                resolved.len(),
                target_name,
                version,
                resolved
                    .iter()
                    .map(|set| set.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        resolved
    }

    /// 只解析单一功能
    pub fn resolve_feature(
        &self,
        target_name: &str,
        version: &OsVersion,
        feature: FeatureTag,
    ) -> Vec<&'c RuleSet> {
        if !self.is_enabled(feature) {
            return Vec::new();
        }
        self.catalog
            .sets_for_feature(feature)
            .filter(|set| set.applies_to(target_name, version))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RuleScope, VersionRange};

    const V10_15: OsVersion = OsVersion::new(10, 15, 0);
    const V13: OsVersion = OsVersion::new(13, 0, 0);

    /// 合并表自 10.15 起，按年代拆分的表自 13.0 起
    fn catalog() -> RuleCatalog {
        RuleCatalog::builder()
            .rule_set(
                "sidecar_combined",
                FeatureTag::SidecarAirPlayModel,
                RuleScope::new(["SidecarCore", "AirPlaySupport"], VersionRange::since(V10_15)),
            )
            .rule(
                "combined_imac",
                b"iMac13,1\0iMac13,2\0".to_vec(),
                b"iNac13,1\0iNac13,2\0".to_vec(),
            )
            .rule_set(
                "sidecar_era_imac_2012",
                FeatureTag::SidecarAirPlayModel,
                RuleScope::new(["SidecarCore", "AirPlaySupport"], VersionRange::since(V13)),
            )
            .rule("era_imac", b"iMac13,1\0".to_vec(), b"iNac13,1\0".to_vec())
            .rule_set(
                "nightshift",
                FeatureTag::NightShiftFloor,
                RuleScope::new(["CoreBrightness"], VersionRange::any()),
            )
            .rule("floor", vec![9, 0, 0, 0], vec![1, 0, 0, 0])
            .build()
            .unwrap()
    }

    fn names(sets: &[&RuleSet]) -> Vec<String> {
        sets.iter().map(|set| set.name().to_string()).collect()
    }

    #[test]
    fn test_resolve_by_version() {
        let catalog = catalog();
        let resolver = RuleSetResolver::new(&catalog);

        let early = resolver.resolve("SidecarCore", &OsVersion::new(12, 6, 0));
        assert_eq!(names(&early), vec!["sidecar_combined"]);

        let late = resolver.resolve("SidecarCore", &OsVersion::new(13, 1, 0));
        assert_eq!(names(&late), vec!["sidecar_combined", "sidecar_era_imac_2012"]);

        assert!(resolver
            .resolve("SidecarCore", &OsVersion::new(10, 14, 6))
            .is_empty());
    }

    #[test]
    fn test_resolve_by_path_leaf() {
        let catalog = catalog();
        let resolver = RuleSetResolver::new(&catalog);
        let sets = resolver.resolve(
            "/System/Library/PrivateFrameworks/CoreBrightness.framework/Versions/A/CoreBrightness",
            &OsVersion::new(11, 0, 0),
        );
        assert_eq!(names(&sets), vec!["nightshift"]);
    }

    #[test]
    fn test_unknown_target_resolves_nothing() {
        let catalog = catalog();
        let resolver = RuleSetResolver::new(&catalog);
        assert!(resolver.resolve("Finder", &V13).is_empty());
    }

    #[test]
    fn test_feature_filter() {
        let catalog = catalog();
        let resolver = RuleSetResolver::new(&catalog).with_features([FeatureTag::NightShiftFloor]);
        assert!(resolver.resolve("SidecarCore", &V13).is_empty());
        assert!(resolver
            .resolve_feature("SidecarCore", &V13, FeatureTag::SidecarAirPlayModel)
            .is_empty());

        let unfiltered = RuleSetResolver::new(&catalog);
        let sets =
            unfiltered.resolve_feature("AirPlaySupport", &V13, FeatureTag::SidecarAirPlayModel);
        assert_eq!(sets.len(), 2);
    }
}
