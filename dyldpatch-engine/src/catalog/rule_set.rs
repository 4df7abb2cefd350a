use crate::core::{FeatureTag, OsVersion, PatternRule, RuleScope};

/// 规则集：同一功能、同一字节布局的一组有序规则
/// 同一功能可存在多个规则集（合并表 / 按年代拆分的替代表），由版本区间区分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    name: String,
    feature: FeatureTag,
    scope: RuleScope,
    description: Option<String>,
    rules: Vec<PatternRule>,
}

impl RuleSet {
    pub fn new(
        name: impl Into<String>,
        feature: FeatureTag,
        scope: RuleScope,
        rules: Vec<PatternRule>,
    ) -> Self {
        Self {
            name: name.into(),
            feature,
            scope,
            description: None,
            rules,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn push_rule(&mut self, rule: PatternRule) {
        self.rules.push(rule);
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn feature(&self) -> FeatureTag {
        self.feature
    }

    #[inline]
    pub fn scope(&self) -> &RuleScope {
        &self.scope
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 是否适用于指定目标镜像 + 系统版本
    #[inline]
    pub fn applies_to(&self, target_name: &str, version: &OsVersion) -> bool {
        self.scope.matches(target_name, version)
    }
}
