use std::fmt::{Display, Formatter};
use std::sync::Arc;

use super::enums::FeatureTag;
use super::version::{OsVersion, VersionRange};
use crate::error::CoreResult;
use crate::verify::VerifyGate;

/// 匹配任意目标镜像的通配目标名
pub const ANY_TARGET: &str = "*";

/// 规则适用范围：目标镜像 + 系统版本区间
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleScope {
    /// 目标镜像名（框架名 / 镜像路径最后一段 / "*"）
    pub targets: Vec<String>,
    pub versions: VersionRange,
}

impl RuleScope {
    pub fn new<I, S>(targets: I, versions: VersionRange) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            versions,
        }
    }

    /// 目标名匹配：完全相等 / 路径最后一段相等 / 通配
    pub fn matches_target(&self, target_name: &str) -> bool {
        let leaf = target_name.rsplit('/').next().unwrap_or(target_name);
        self.targets
            .iter()
            .any(|t| t == ANY_TARGET || t == target_name || t == leaf)
    }

    #[inline]
    pub fn matches_version(&self, version: &OsVersion) -> bool {
        self.versions.contains(version)
    }

    #[inline]
    pub fn matches(&self, target_name: &str, version: &OsVersion) -> bool {
        self.matches_target(target_name) && self.matches_version(version)
    }
}

impl Display for RuleScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] @ {}", self.targets.join(", "), self.versions)
    }
}

/// 单条等长查找/替换规则
/// 字段私有：只能经由校验路径构建，needle 与 replacement 长度恒等
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    id: Arc<str>,
    feature: FeatureTag,
    scope: RuleScope,
    needle: Arc<[u8]>,
    replacement: Arc<[u8]>,
}

impl PatternRule {
    /// 构建规则，长度不一致或 needle 为空时返回 ConfigError
    pub fn new(
        id: impl Into<String>,
        feature: FeatureTag,
        scope: RuleScope,
        needle: impl Into<Vec<u8>>,
        replacement: impl Into<Vec<u8>>,
    ) -> CoreResult<Self> {
        let id = id.into();
        let needle = needle.into();
        let replacement = replacement.into();
        VerifyGate::check_rule(&id, &needle, &replacement)?;
        Ok(Self::assemble(id, feature, scope, needle, replacement))
    }

    /// 目录构建器内部使用：校验统一交给 VerifyGate::validate
    pub(crate) fn assemble(
        id: String,
        feature: FeatureTag,
        scope: RuleScope,
        needle: Vec<u8>,
        replacement: Vec<u8>,
    ) -> Self {
        Self {
            id: Arc::from(id),
            feature,
            scope,
            needle: Arc::from(needle),
            replacement: Arc::from(replacement),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn feature(&self) -> FeatureTag {
        self.feature
    }

    #[inline]
    pub fn scope(&self) -> &RuleScope {
        &self.scope
    }

    #[inline]
    pub fn needle(&self) -> &[u8] {
        &self.needle
    }

    #[inline]
    pub fn replacement(&self) -> &[u8] {
        &self.replacement
    }

    /// 补丁宽度（needle/replacement 共同长度）
    #[inline]
    pub fn width(&self) -> usize {
        self.needle.len()
    }

    /// replacement 与 needle 相同的规则重复应用不会收敛到零匹配
    pub fn is_identity(&self) -> bool {
        self.needle == self.replacement
    }
}
