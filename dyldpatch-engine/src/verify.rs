//! 加载期不变量校验
//! 规则目录构建前对全部规则执行一次，任一违规即拒绝整个目录：
//! 不存在未经校验的 RuleCatalog，也就不可能对镜像执行长度不等的写入。

use rustc_hash::FxHashSet;

use crate::catalog::RuleSet;
use crate::error::{ConfigError, CoreResult};

/// 规则目录校验门
#[derive(Debug, Default, Clone, Copy)]
pub struct VerifyGate;

impl VerifyGate {
    /// 单条规则校验：needle 非空，且与 replacement 等长
    pub fn check_rule(rule_id: &str, needle: &[u8], replacement: &[u8]) -> Result<(), ConfigError> {
        if needle.is_empty() {
            return Err(ConfigError::EmptyNeedle {
                rule_id: rule_id.to_string(),
            });
        }
        if needle.len() != replacement.len() {
            return Err(ConfigError::LengthMismatch {
                rule_id: rule_id.to_string(),
                needle_len: needle.len(),
                replacement_len: replacement.len(),
            });
        }
        Ok(())
    }

    /// 收集全部违规项（不短路），便于一次性输出
    pub fn violations(rule_sets: &[RuleSet]) -> Vec<ConfigError> {
        let mut violations = Vec::new();
        let mut set_names = FxHashSet::default();
        let mut rule_ids = FxHashSet::default();

        for set in rule_sets {
            if !set_names.insert(set.name()) {
                violations.push(ConfigError::DuplicateRuleSet(set.name().to_string()));
            }
            if set.rules().is_empty() {
                violations.push(ConfigError::EmptyRuleSet(set.name().to_string()));
            }

            for rule in set.rules() {
                if let Err(e) = Self::check_rule(rule.id(), rule.needle(), rule.replacement()) {
                    violations.push(e);
                }
                if !rule_ids.insert(rule.id()) {
                    violations.push(ConfigError::DuplicateRuleId(rule.id().to_string()));
                }
                if rule.feature() != set.feature() {
                    violations.push(ConfigError::FeatureMismatch {
                        rule_id: rule.id().to_string(),
                        rule_set: set.name().to_string(),
                        rule_feature: rule.feature().to_string(),
                        set_feature: set.feature().to_string(),
                    });
                }
            }
        }

        violations
    }

    /// 目录级校验：记录全部违规，返回第一条
    pub fn validate(rule_sets: &[RuleSet]) -> CoreResult<()> {
        let violations = Self::violations(rule_sets);
        for violation in &violations {
            log::error!("Rule catalog violation: {}", violation);
        }

        match violations.into_iter().next() {
            None => Ok(()),
            Some(first) => {
                log::error!(
                    "Rule catalog rejected across {} rule set(s)",
                    rule_sets.len()
                );
                Err(first.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FeatureTag, PatternRule, RuleScope, VersionRange};
    use crate::error::CoreError;

    fn rule(id: &str, needle: &[u8], replacement: &[u8]) -> PatternRule {
        PatternRule::assemble(
            id.to_string(),
            FeatureTag::SidecarAirPlayModel,
            RuleScope::new(["SidecarCore"], VersionRange::any()),
            needle.to_vec(),
            replacement.to_vec(),
        )
    }

    fn set(name: &str, rules: Vec<PatternRule>) -> RuleSet {
        RuleSet::new(
            name,
            FeatureTag::SidecarAirPlayModel,
            RuleScope::new(["SidecarCore"], VersionRange::any()),
            rules,
        )
    }

    #[test]
    fn test_validate_accepts_well_formed_sets() {
        let sets = vec![set(
            "sidecar",
            vec![rule("imac", b"iMac13,1\0", b"iNac13,1\0")],
        )];
        assert!(VerifyGate::validate(&sets).is_ok());
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        let sets = vec![set(
            "sidecar",
            vec![
                rule("ok", b"iMac13,2\0", b"iNac13,2\0"),
                rule("bad", b"iMac13,1\0", b"iNac13,1"),
            ],
        )];
        let err = VerifyGate::validate(&sets).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::LengthMismatch {
                ref rule_id,
                needle_len: 9,
                replacement_len: 8,
            }) if rule_id == "bad"
        ));
    }

    #[test]
    fn test_violations_are_all_collected() {
        let sets = vec![
            set("dup", vec![rule("a", b"x", b"y"), rule("a", b"", b"")]),
            set("dup", vec![]),
        ];
        let violations = VerifyGate::violations(&sets);
        assert!(violations.contains(&ConfigError::DuplicateRuleId("a".to_string())));
        assert!(violations.contains(&ConfigError::EmptyNeedle {
            rule_id: "a".to_string()
        }));
        assert!(violations.contains(&ConfigError::DuplicateRuleSet("dup".to_string())));
        assert!(violations.contains(&ConfigError::EmptyRuleSet("dup".to_string())));
    }

    #[test]
    fn test_feature_mismatch_is_rejected() {
        let stray = PatternRule::assemble(
            "stray".to_string(),
            FeatureTag::NightShiftFloor,
            RuleScope::default(),
            vec![1, 0, 0, 0],
            vec![1, 0, 0, 0],
        );
        let sets = vec![set("sidecar", vec![stray])];
        assert!(matches!(
            VerifyGate::validate(&sets),
            Err(CoreError::Config(ConfigError::FeatureMismatch { .. }))
        ));
    }
}
