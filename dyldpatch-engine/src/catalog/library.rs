use rustc_hash::FxHashMap;

use super::builder::RuleCatalogBuilder;
use super::rule_set::RuleSet;
use crate::core::{FeatureTag, PatternRule};
use crate::error::CoreResult;
use crate::verify::VerifyGate;

/// 规则目录 - 纯静态结构
/// 构建时经 VerifyGate 校验，之后整个生命周期不可变，由调用方 Arc 共享只读
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    sets: Vec<RuleSet>,
    /// 规则集名称 → 下标
    set_index: FxHashMap<String, usize>,
    /// 功能 → 规则集下标（保持目录顺序）
    feature_index: FxHashMap<FeatureTag, Vec<usize>>,
    /// 规则ID → (规则集下标, 规则下标)
    rule_index: FxHashMap<String, (usize, usize)>,
}

impl RuleCatalog {
    /// 校验并构建目录，任一规则违规即整体拒绝
    pub fn new(sets: Vec<RuleSet>) -> CoreResult<Self> {
        VerifyGate::validate(&sets)?;

        let mut set_index = FxHashMap::default();
        let mut feature_index: FxHashMap<FeatureTag, Vec<usize>> = FxHashMap::default();
        let mut rule_index = FxHashMap::default();

        for (set_idx, set) in sets.iter().enumerate() {
            set_index.insert(set.name().to_string(), set_idx);
            feature_index.entry(set.feature()).or_default().push(set_idx);
            for (rule_idx, rule) in set.rules().iter().enumerate() {
                rule_index.insert(rule.id().to_string(), (set_idx, rule_idx));
            }
        }

        let catalog = Self {
            sets,
            set_index,
            feature_index,
            rule_index,
        };

        log::debug!(
            "Rule catalog built: {} rule set(s), {} rule(s), {} feature(s)",
            catalog.len(),
            catalog.rule_count(),
            catalog.feature_index.len()
        );

        Ok(catalog)
    }

    /// 空目录（合法，任何目标都解析不到规则集）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> RuleCatalogBuilder {
        RuleCatalogBuilder::new()
    }

    /// 全部规则集（目录顺序）
    #[inline]
    pub fn rule_sets(&self) -> &[RuleSet] {
        &self.sets
    }

    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.set_index.get(name).map(|&idx| &self.sets[idx])
    }

    /// 指定功能下的全部规则集（目录顺序）
    pub fn sets_for_feature(&self, feature: FeatureTag) -> impl Iterator<Item = &RuleSet> + '_ {
        self.feature_index
            .get(&feature)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.sets[idx])
    }

    /// 按规则ID查找规则及其所属规则集
    pub fn rule(&self, rule_id: &str) -> Option<(&RuleSet, &PatternRule)> {
        self.rule_index.get(rule_id).map(|&(set_idx, rule_idx)| {
            let set = &self.sets[set_idx];
            (set, &set.rules()[rule_idx])
        })
    }

    /// 目录中出现过的功能（升序）
    pub fn features(&self) -> Vec<FeatureTag> {
        let mut features: Vec<FeatureTag> = self.feature_index.keys().copied().collect();
        features.sort();
        features
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.sets.iter().map(RuleSet::len).sum()
    }
}
