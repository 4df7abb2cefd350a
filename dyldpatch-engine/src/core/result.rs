use serde::Serialize;
use std::fmt::{Display, Formatter};

use super::enums::FeatureTag;

/// 单条规则的扫描记录（SCANNED 阶段产物）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub rule_id: String,
    pub offsets: Vec<usize>,
}

impl MatchRecord {
    #[inline]
    pub fn occurrences(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// 单条规则的补丁状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    /// 全部匹配均已写入
    Applied,
    /// 写入中途被拒绝，之前的写入保留
    PartiallyApplied,
    /// 零匹配，规则不适用于当前镜像
    Skipped,
}

impl Display for PatchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchStatus::Applied => write!(f, "applied"),
            PatchStatus::PartiallyApplied => write!(f, "partially_applied"),
            PatchStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// 单条规则的补丁结果，交给调用方记录日志/决策
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchResult {
    pub rule_id: String,
    /// 所属规则集（脱离目录单独应用规则时为 None）
    pub rule_set: Option<String>,
    pub feature: FeatureTag,
    pub occurrences_found: usize,
    pub occurrences_patched: usize,
    pub status: PatchStatus,
    /// 写入被拒绝的偏移（仅 PartiallyApplied）
    pub denied_at: Option<usize>,
}

impl PatchResult {
    pub fn is_applied(&self) -> bool {
        self.status == PatchStatus::Applied
    }
}

impl Display for PatchResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(set) = &self.rule_set {
            write!(f, "{}/", set)?;
        }
        write!(
            f,
            "{} [{}] {}: {}/{} patched",
            self.rule_id,
            self.feature,
            self.status,
            self.occurrences_patched,
            self.occurrences_found
        )?;
        if let Some(offset) = self.denied_at {
            write!(f, " (denied at {:#x})", offset)?;
        }
        Ok(())
    }
}
