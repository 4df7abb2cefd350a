//! 原地补丁应用
//! 对规则 needle 的每个匹配位置写入等长 replacement：
//! 1. 镜像长度不变，匹配区间以外的字节不变
//! 2. 写入失败时立即停止该规则，已写入的保留，返回 AccessDenied / WriteFailed（含进度）
//! 3. 零匹配为 Skipped，不修改镜像；对已打过补丁的镜像重复应用即为零匹配

use crate::core::{MatchRecord, PatchResult, PatchStatus, PatternRule};
use crate::error::{CoreError, CoreResult};
use crate::image::ImageBuffer;
use crate::matcher::PatternMatcher;
use crate::utils::preview::preview_bytes;

/// 补丁应用器（无状态）
#[derive(Debug, Default, Clone, Copy)]
pub struct PatchApplier;

impl PatchApplier {
    /// 扫描阶段：只读，记录全部匹配偏移
    pub fn scan<B: ImageBuffer + ?Sized>(&self, image: &B, rule: &PatternRule) -> MatchRecord {
        MatchRecord {
            rule_id: rule.id().to_string(),
            offsets: PatternMatcher::scan(image.bytes(), rule.needle()),
        }
    }

    /// 扫描 + 写入
    pub fn apply<B: ImageBuffer + ?Sized>(
        &self,
        image: &mut B,
        rule: &PatternRule,
    ) -> CoreResult<PatchResult> {
        let record = self.scan(&*image, rule);
        self.commit(image, rule, &record)
    }

    /// 写入阶段：按扫描记录逐个覆盖（升序，重叠匹配后写者覆盖先写者）
    pub fn commit<B: ImageBuffer + ?Sized>(
        &self,
        image: &mut B,
        rule: &PatternRule,
        record: &MatchRecord,
    ) -> CoreResult<PatchResult> {
        let found = record.occurrences();
        if found == 0 {
            log::trace!(
                "Rule [{}] no match for {}",
                rule.id(),
                preview_bytes(rule.needle(), 32)
            );
            return Ok(Self::result(rule, 0, 0, PatchStatus::Skipped, None));
        }

        let mut patched = 0;
        for &offset in &record.offsets {
            if let Err(e) = image.write_at(offset, rule.replacement()) {
                log::warn!(
                    "Rule [{}] write rejected at {:#x} after {}/{} occurrences: {}",
                    rule.id(),
                    offset,
                    patched,
                    found,
                    e
                );
                return Err(match e {
                    CoreError::AccessDenied { .. } => CoreError::AccessDenied {
                        rule_id: rule.id().to_string(),
                        offset,
                        found,
                        patched,
                    },
                    other => CoreError::WriteFailed {
                        rule_id: rule.id().to_string(),
                        offset,
                        found,
                        patched,
                        reason: other.to_string(),
                    },
                });
            }
            log::trace!("Rule [{}] patched {:#x}", rule.id(), offset);
            patched += 1;
        }

        log::debug!(
            "Rule [{}] applied {} occurrence(s): {} -> {}",
            rule.id(),
            patched,
            preview_bytes(rule.needle(), 32),
            preview_bytes(rule.replacement(), 32)
        );
        Ok(Self::result(rule, found, patched, PatchStatus::Applied, None))
    }

    /// 写入失败（AccessDenied / WriteFailed）转换为 PartiallyApplied 结果，其他错误原样返回
    pub fn settle(rule: &PatternRule, outcome: CoreResult<PatchResult>) -> CoreResult<PatchResult> {
        match outcome {
            Err(CoreError::AccessDenied {
                offset,
                found,
                patched,
                ..
            })
            | Err(CoreError::WriteFailed {
                offset,
                found,
                patched,
                ..
            }) => Ok(Self::result(
                rule,
                found,
                patched,
                PatchStatus::PartiallyApplied,
                Some(offset),
            )),
            other => other,
        }
    }

    fn result(
        rule: &PatternRule,
        found: usize,
        patched: usize,
        status: PatchStatus,
        denied_at: Option<usize>,
    ) -> PatchResult {
        PatchResult {
            rule_id: rule.id().to_string(),
            rule_set: None,
            feature: rule.feature(),
            occurrences_found: found,
            occurrences_patched: patched,
            status,
            denied_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FeatureTag, RuleScope, VersionRange};
    use crate::image::PagedImage;

    fn imac_rule() -> PatternRule {
        PatternRule::new(
            "imac_13_1",
            FeatureTag::SidecarAirPlayModel,
            RuleScope::new(["SidecarCore"], VersionRange::any()),
            b"iMac13,1\0".to_vec(),
            b"iNac13,1\0".to_vec(),
        )
        .unwrap()
    }

    fn image_with_two_copies() -> Vec<u8> {
        let mut buf = b"__TEXT\0\0".to_vec();
        buf.extend_from_slice(b"iMac13,1\0");
        buf.extend_from_slice(b"MacBook8,1\0");
        buf.extend_from_slice(b"iMac13,1\0");
        buf.extend_from_slice(b"\xDE\xAD\xBE\xEF");
        buf
    }

    #[test]
    fn test_apply_rewrites_every_occurrence() {
        let original = image_with_two_copies();
        let mut image = original.clone();
        let rule = imac_rule();

        let result = PatchApplier.apply(&mut image, &rule).unwrap();
        assert_eq!(result.occurrences_found, 2);
        assert_eq!(result.occurrences_patched, 2);
        assert_eq!(result.status, PatchStatus::Applied);

        assert_eq!(image.len(), original.len());
        assert_eq!(&image[8..17], b"iNac13,1\0");
        assert_eq!(&image[28..37], b"iNac13,1\0");
        // 匹配区间以外字节不变
        for (idx, (a, b)) in original.iter().zip(image.iter()).enumerate() {
            if !(8..17).contains(&idx) && !(28..37).contains(&idx) {
                assert_eq!(a, b, "byte {} changed", idx);
            }
        }
    }

    #[test]
    fn test_apply_without_match_is_noop() {
        let original = b"MacBookPro9,1\0Macmini6,1\0".to_vec();
        let mut image = original.clone();

        let result = PatchApplier.apply(&mut image, &imac_rule()).unwrap();
        assert_eq!(result.occurrences_found, 0);
        assert_eq!(result.occurrences_patched, 0);
        assert_eq!(result.status, PatchStatus::Skipped);
        assert_eq!(image, original);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut image = image_with_two_copies();
        let rule = imac_rule();

        PatchApplier.apply(&mut image, &rule).unwrap();
        let patched = image.clone();
        assert!(PatternMatcher::scan(&image, rule.needle()).is_empty());

        let again = PatchApplier.apply(&mut image, &rule).unwrap();
        assert_eq!(again.status, PatchStatus::Skipped);
        assert_eq!(image, patched);
    }

    #[test]
    fn test_apply_reports_partial_progress_on_access_denied() {
        let mut raw = vec![0u8; 64];
        raw[2..11].copy_from_slice(b"iMac13,1\0");
        raw[40..49].copy_from_slice(b"iMac13,1\0");
        let rule = imac_rule();

        let mut image = PagedImage::new(&mut raw, 32).unwrap();
        image.protect(32, 32);

        let err = PatchApplier.apply(&mut image, &rule).unwrap_err();
        match &err {
            CoreError::AccessDenied {
                rule_id,
                offset,
                found,
                patched,
            } => {
                assert_eq!(rule_id, "imac_13_1");
                assert_eq!(*offset, 40);
                assert_eq!(*found, 2);
                assert_eq!(*patched, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let settled = PatchApplier::settle(&rule, Err(err)).unwrap();
        assert_eq!(settled.status, PatchStatus::PartiallyApplied);
        assert_eq!(settled.denied_at, Some(40));
        assert_eq!(settled.occurrences_patched, 1);

        // 第一处写入保留，第二处未改动
        assert_eq!(&raw[2..11], b"iNac13,1\0");
        assert_eq!(&raw[40..49], b"iMac13,1\0");
    }

    #[test]
    fn test_overlapping_occurrences_last_write_wins() {
        let rule = PatternRule::new(
            "overlap",
            FeatureTag::NightShiftFloor,
            RuleScope::default(),
            b"aba".to_vec(),
            b"xyz".to_vec(),
        )
        .unwrap();
        let mut image = b"ababa".to_vec();

        let result = PatchApplier.apply(&mut image, &rule).unwrap();
        assert_eq!(result.occurrences_found, 2);
        assert_eq!(result.occurrences_patched, 2);
        assert_eq!(&image, b"xyxyz");
    }
}
