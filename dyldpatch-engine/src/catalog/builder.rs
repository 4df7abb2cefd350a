use super::library::RuleCatalog;
use super::rule_set::RuleSet;
use crate::core::{FeatureTag, PatternRule, RuleScope};
use crate::error::{CoreError, CoreResult};

/// 规则目录链式构建器
/// 规则继承所在规则集的功能标签与适用范围，全部规则在 build() 时统一校验
#[derive(Debug, Default)]
pub struct RuleCatalogBuilder {
    sets: Vec<RuleSet>,
    /// 首个构建期错误，build() 时返回
    error: Option<CoreError>,
}

impl RuleCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开启新规则集，之后的 rule() 调用追加到该规则集
    pub fn rule_set(mut self, name: impl Into<String>, feature: FeatureTag, scope: RuleScope) -> Self {
        self.sets.push(RuleSet::new(name, feature, scope, Vec::new()));
        self
    }

    /// 为当前规则集设置描述
    pub fn description(mut self, description: impl Into<String>) -> Self {
        if let Some(set) = self.sets.pop() {
            self.sets.push(set.with_description(description));
        }
        self
    }

    /// 向当前规则集追加规则
    pub fn rule(
        mut self,
        id: impl Into<String>,
        needle: impl Into<Vec<u8>>,
        replacement: impl Into<Vec<u8>>,
    ) -> Self {
        let id = id.into();
        match self.sets.last_mut() {
            Some(set) => {
                let rule = PatternRule::assemble(
                    id,
                    set.feature(),
                    set.scope().clone(),
                    needle.into(),
                    replacement.into(),
                );
                set.push_rule(rule);
            }
            None => {
                if self.error.is_none() {
                    self.error = Some(CoreError::InvalidInput(format!(
                        "rule [{}] declared before any rule set",
                        id
                    )));
                }
            }
        }
        self
    }

    /// 追加已构建好的规则集
    pub fn push_set(mut self, set: RuleSet) -> Self {
        self.sets.push(set);
        self
    }

    pub fn build(self) -> CoreResult<RuleCatalog> {
        if let Some(err) = self.error {
            return Err(err);
        }
        RuleCatalog::new(self.sets)
    }
}
