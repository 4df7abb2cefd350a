//! 单次补丁会话
//! 状态流转：PENDING → SCANNED → {APPLIED | PARTIALLY_APPLIED | SKIPPED} → DONE
//! 单向线性执行，无重试：每条规则按目录顺序扫描后立即写入，
//! 因此后续规则看到的是前序规则改写后的镜像。

use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::time::Instant;

use crate::applier::PatchApplier;
use crate::catalog::RuleCatalog;
use crate::core::{FeatureTag, MatchRecord, OsVersion, PatchResult, PatchStatus};
use crate::error::{CoreError, CoreResult};
use crate::image::ImageBuffer;
use crate::resolver::RuleSetResolver;
use crate::stats::SessionStats;

/// 会话（及其中每条规则）所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    Scanned,
    Applied,
    PartiallyApplied,
    Skipped,
    Done,
}

impl From<PatchStatus> for SessionState {
    fn from(status: PatchStatus) -> Self {
        match status {
            PatchStatus::Applied => SessionState::Applied,
            PatchStatus::PartiallyApplied => SessionState::PartiallyApplied,
            PatchStatus::Skipped => SessionState::Skipped,
        }
    }
}

/// 会话整体结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// 至少写入一处，且没有写入被拒绝
    Applied,
    /// 至少一条规则写入被拒绝
    PartiallyApplied,
    /// 没有任何写入（含无候选规则集）
    Skipped,
}

impl Display for SessionOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionOutcome::Applied => write!(f, "applied"),
            SessionOutcome::PartiallyApplied => write!(f, "partially_applied"),
            SessionOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// 会话报告
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub target: String,
    pub os_version: OsVersion,
    pub outcome: SessionOutcome,
    pub results: Vec<PatchResult>,
    pub stats: SessionStats,
}

impl SessionReport {
    fn from_results(
        target: String,
        os_version: OsVersion,
        results: Vec<PatchResult>,
        stats: SessionStats,
    ) -> Self {
        let outcome = if results
            .iter()
            .any(|r| r.status == PatchStatus::PartiallyApplied)
        {
            SessionOutcome::PartiallyApplied
        } else if stats.touched() {
            SessionOutcome::Applied
        } else {
            SessionOutcome::Skipped
        };

        Self {
            target,
            os_version,
            outcome,
            results,
            stats,
        }
    }

    /// 指定规则的结果
    pub fn result(&self, rule_id: &str) -> Option<&PatchResult> {
        self.results.iter().find(|r| r.rule_id == rule_id)
    }

    pub fn patched_occurrences(&self) -> usize {
        self.results.iter().map(|r| r.occurrences_patched).sum()
    }
}

/// 单镜像补丁会话
#[derive(Debug)]
pub struct PatchSession<'c> {
    resolver: RuleSetResolver<'c>,
    applier: PatchApplier,
    target: String,
    version: OsVersion,
    state: SessionState,
}

impl<'c> PatchSession<'c> {
    pub fn new(catalog: &'c RuleCatalog, target: impl Into<String>, version: OsVersion) -> Self {
        Self {
            resolver: RuleSetResolver::new(catalog),
            applier: PatchApplier,
            target: target.into(),
            version,
            state: SessionState::Pending,
        }
    }

    /// 仅启用指定功能
    pub fn with_features<I>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = FeatureTag>,
    {
        self.resolver = self.resolver.with_features(features);
        self
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        log::trace!(
            "Session [{}] {:?} -> {:?}",
            self.target,
            self.state,
            next
        );
        self.state = next;
    }

    /// 执行会话：逐规则扫描 + 写入
    /// 写入失败只放弃当前规则剩余匹配，记为 PartiallyApplied 并继续下一条规则；
    /// 会话只能执行一次，重复执行返回 InvalidInput
    pub fn run<B: ImageBuffer + ?Sized>(&mut self, image: &mut B) -> CoreResult<SessionReport> {
        if self.state != SessionState::Pending {
            return Err(CoreError::InvalidInput(format!(
                "patch session for [{}] already ran",
                self.target
            )));
        }

        let start = Instant::now();
        let rule_sets = self.resolver.resolve(&self.target, &self.version);
        let mut stats = SessionStats {
            rule_sets_resolved: rule_sets.len(),
            ..SessionStats::default()
        };
        let mut results = Vec::new();

        for set in rule_sets {
            for rule in set.rules() {
                let record = self.applier.scan(&*image, rule);
                self.transition(SessionState::Scanned);

                let committed = self.applier.commit(image, rule, &record);
                let mut result = PatchApplier::settle(rule, committed)?;
                result.rule_set = Some(set.name().to_string());
                self.transition(result.status.into());

                stats.record(&result, rule.width());
                results.push(result);
            }
        }

        self.transition(SessionState::Done);
        stats.print_stats(start.elapsed());

        let report = SessionReport::from_results(self.target.clone(), self.version, results, stats);
        log::debug!(
            "Session [{}] on {} finished: {}",
            report.target,
            report.os_version,
            report.outcome
        );
        Ok(report)
    }

    /// 只扫描不写入：每条规则针对原始镜像单独扫描
    pub fn scan_only(&self, image: &[u8]) -> Vec<MatchRecord> {
        self.resolver
            .resolve(&self.target, &self.version)
            .into_iter()
            .flat_map(|set| set.rules())
            .map(|rule| self.applier.scan(image, rule))
            .collect()
    }
}
