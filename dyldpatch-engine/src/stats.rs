//! 补丁会话统计：定义、更新与格式化输出

use crate::core::{PatchResult, PatchStatus};

/// 单次补丁会话统计信息
/// 记录会话中的各类指标：
/// 1. 解析到的规则集数 / 规则数
/// 2. 各状态规则数（已应用/部分应用/跳过）
/// 3. 匹配总数 / 写入总数 / 被拒绝写入数
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SessionStats {
    // ========== 解析统计 ==========
    /// 解析到的规则集数量
    pub rule_sets_resolved: usize,
    /// 参与扫描的规则数量
    pub rules_evaluated: u32,

    // ========== 状态统计 ==========
    pub rules_applied: u32,
    pub rules_partially_applied: u32,
    pub rules_skipped: u32,

    // ========== 字节统计 ==========
    /// 匹配总数
    pub occurrences_found: usize,
    /// 实际写入总数
    pub occurrences_patched: usize,
    /// 写入覆盖的字节总数
    pub bytes_rewritten: u64,
    /// 被拒绝的写入次数
    pub writes_denied: u32,
}

impl SessionStats {
    /// 累加一条规则的补丁结果
    /// 参数：
    /// - result: 规则补丁结果
    /// - width: 规则字节宽度（needle 长度）
    pub fn record(&mut self, result: &PatchResult, width: usize) {
        self.rules_evaluated += 1;
        self.occurrences_found += result.occurrences_found;
        self.occurrences_patched += result.occurrences_patched;
        self.bytes_rewritten += (result.occurrences_patched as u64) * (width as u64);

        match result.status {
            PatchStatus::Applied => self.rules_applied += 1,
            PatchStatus::PartiallyApplied => {
                self.rules_partially_applied += 1;
                self.writes_denied += 1;
            }
            PatchStatus::Skipped => self.rules_skipped += 1,
        }
    }

    /// 是否有任何字节被改写
    #[inline]
    pub fn touched(&self) -> bool {
        self.occurrences_patched > 0
    }

    /// 格式化输出统计信息（结构化日志）
    /// 参数：total_time - 会话总耗时
    pub fn print_stats(&self, total_time: std::time::Duration) {
        log::debug!(
            "Patch session completed | Time: {:?} | Rule sets: {} | Rules: {}",
            total_time,
            self.rule_sets_resolved,
            self.rules_evaluated
        );

        log::debug!(
            "Rule status: applied {} | partially applied {} | skipped {}",
            self.rules_applied,
            self.rules_partially_applied,
            self.rules_skipped
        );

        log::debug!(
            "Occurrences: found {} -> patched {} ({} bytes) | denied writes {}",
            self.occurrences_found,
            self.occurrences_patched,
            self.bytes_rewritten,
            self.writes_denied
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FeatureTag;

    fn result(found: usize, patched: usize, status: PatchStatus) -> PatchResult {
        PatchResult {
            rule_id: "r".to_string(),
            rule_set: None,
            feature: FeatureTag::SidecarAirPlayModel,
            occurrences_found: found,
            occurrences_patched: patched,
            status,
            denied_at: None,
        }
    }

    #[test]
    fn test_record_accumulates() {
        let mut stats = SessionStats::default();
        stats.record(&result(2, 2, PatchStatus::Applied), 9);
        stats.record(&result(0, 0, PatchStatus::Skipped), 9);
        stats.record(&result(3, 1, PatchStatus::PartiallyApplied), 4);

        assert_eq!(stats.rules_evaluated, 3);
        assert_eq!(stats.rules_applied, 1);
        assert_eq!(stats.rules_skipped, 1);
        assert_eq!(stats.rules_partially_applied, 1);
        assert_eq!(stats.occurrences_found, 5);
        assert_eq!(stats.occurrences_patched, 3);
        assert_eq!(stats.bytes_rewritten, 22);
        assert_eq!(stats.writes_denied, 1);
        assert!(stats.touched());
        assert!(!SessionStats::default().touched());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_record_counts_beyond_u32() {
        let big = u32::MAX as usize + 2;
        let mut stats = SessionStats::default();
        stats.record(&result(big, big, PatchStatus::Applied), 4);
        assert_eq!(stats.occurrences_found, big);
        assert_eq!(stats.occurrences_patched, big);
        assert_eq!(stats.bytes_rewritten, big as u64 * 4);
    }
}
