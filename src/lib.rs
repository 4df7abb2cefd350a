//! dyldpatch - 框架镜像字节级补丁库
//! 通过等长查找/替换改写镜像中的机型标识串与能力表，放行不在白名单中的机型

pub mod config;
pub mod error;
pub mod patcher;
pub mod rule;

// 导出全局错误类型
pub use self::error::{DyldPatchError, DyldResult};

// 导出配置模块核心结构体与构建器
pub use crate::config::{CatalogOrigin, CustomConfigBuilder, FeatureToggles, PatchConfig};

// 导出规则目录加载器
pub use crate::rule::CatalogLoader;

// 导出补丁器核心接口
pub use crate::patcher::{
    global_patcher, init_global_patcher, init_global_patcher_with_catalog, DyldPatcher,
};

// 导出引擎核心结构体
pub use dyldpatch_engine::{
    FeatureTag, ImageBuffer, MatchRecord, OsVersion, PagedImage, PatchResult, PatchStatus,
    RuleCatalog, RuleSet, SessionOutcome, SessionReport,
};

// 嵌入式固化规则目录 - 仅在开启embedded-rules特性时编译
#[cfg(feature = "embedded-rules")]
pub mod dyldpatch_rules {
    use super::*;
    use dyldpatch_engine::CatalogDefinition;
    use lz4_flex::decompress_size_prepended;
    use once_cell::sync::OnceCell;
    use std::borrow::Cow;
    use std::sync::Arc;

    // 文件名与压缩开关由build_config.json配置，build.rs注入环境变量
    static COMPILED_CATALOG: &[u8] =
        include_bytes!(concat!(env!("OUT_DIR"), "/", env!("COMPILED_CATALOG_FILENAME")));
    const COMPILED_CATALOG_COMPRESSED: &str = env!("COMPILED_CATALOG_COMPRESSED");

    /// 全局规则目录单例 - 首次访问时解压、解析并校验，内存中仅一份实例
    static EMBEDDED_CATALOG: OnceCell<Arc<RuleCatalog>> = OnceCell::new();

    /// LZ4解压缩封装 - 适配build.rs的压缩产物
    fn lz4_decompress(bytes: &[u8]) -> DyldResult<Vec<u8>> {
        decompress_size_prepended(bytes).map_err(|e| {
            DyldPatchError::RuleLoadError(format!(
                "LZ4解压缩规则目录失败: {:?}, 压缩包字节长度: {}",
                e,
                bytes.len()
            ))
        })
    }

    /// 内置规则目录（构建期已校验，运行期再经同一 VerifyGate 构建）
    pub fn embedded_catalog() -> DyldResult<Arc<RuleCatalog>> {
        EMBEDDED_CATALOG
            .get_or_try_init(|| -> DyldResult<Arc<RuleCatalog>> {
                let raw: Cow<'static, [u8]> = if COMPILED_CATALOG_COMPRESSED == "true" {
                    Cow::Owned(lz4_decompress(COMPILED_CATALOG)?)
                } else {
                    Cow::Borrowed(COMPILED_CATALOG)
                };

                let catalog = CatalogDefinition::from_slice(&raw)?.build()?;
                log::info!(
                    "Embedded rule catalog loaded: {} rule set(s), {} rule(s)",
                    catalog.len(),
                    catalog.rule_count()
                );
                Ok(Arc::new(catalog))
            })
            .cloned()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use dyldpatch_engine::{PatchSession, RuleSetResolver};

        fn init_logger() {
            let _ = env_logger::builder().is_test(true).try_init();
        }

        fn names(sets: &[&RuleSet]) -> Vec<String> {
            sets.iter().map(|set| set.name().to_string()).collect()
        }

        #[test]
        fn test_embedded_catalog_loads_every_feature() {
            init_logger();
            let catalog = embedded_catalog().unwrap();
            assert_eq!(catalog.features(), FeatureTag::ALL.to_vec());
            assert_eq!(catalog.len(), 7);
            assert!(Arc::ptr_eq(&catalog, &embedded_catalog().unwrap()));

            for set in catalog.rule_sets() {
                for rule in set.rules() {
                    assert_eq!(rule.needle().len(), rule.replacement().len());
                    assert!(!rule.is_identity());
                }
            }
        }

        #[test]
        fn test_era_sets_resolve_after_cutover() {
            let catalog = embedded_catalog().unwrap();
            let resolver = RuleSetResolver::new(&catalog)
                .with_features([FeatureTag::SidecarAirPlayModel]);

            let monterey = resolver.resolve("SidecarCore", &OsVersion::new(12, 5, 0));
            assert_eq!(names(&monterey), vec!["sidecar_airplay_combined"]);

            let ventura = resolver.resolve("AirPlaySupport", &OsVersion::new(13, 0, 0));
            assert_eq!(
                names(&ventura),
                vec!["sidecar_airplay_combined", "sidecar_airplay_era"]
            );
        }

        #[test]
        fn test_era_layout_patched_by_era_set_only() {
            init_logger();
            let catalog = embedded_catalog().unwrap();
            let mut image = b"\0\0\0\0MacPro5,1\0MacPro6,1\0\0\0".to_vec();

            let report = PatchSession::new(&catalog, "SidecarCore", OsVersion::new(13, 0, 0))
                .with_features([FeatureTag::SidecarAirPlayModel])
                .run(&mut image)
                .unwrap();

            for rule_id in [
                "sidecar_airplay_imac",
                "sidecar_airplay_macbook",
                "sidecar_airplay_macbook_pro",
                "sidecar_airplay_standalone_desktop",
            ] {
                let result = report.result(rule_id).unwrap();
                assert_eq!(result.occurrences_found, 0, "{}", rule_id);
                assert_eq!(result.status, PatchStatus::Skipped);
            }
            assert_eq!(
                report.result("sidecar_airplay_macpro").unwrap().occurrences_patched,
                1
            );
            assert_eq!(report.outcome, SessionOutcome::Applied);
            assert_eq!(&image, b"\0\0\0\0NacPro5,1\0NacPro6,1\0\0\0");
        }

        #[test]
        fn test_nightshift_table_by_release() {
            let catalog = embedded_catalog().unwrap();
            let resolver = RuleSetResolver::new(&catalog);

            let high_sierra_early = resolver.resolve("CoreBrightness", &OsVersion::new(10, 13, 0));
            assert_eq!(names(&high_sierra_early), vec!["nightshift_legacy"]);

            let high_sierra = resolver.resolve("CoreBrightness", &OsVersion::new(10, 13, 1));
            assert_eq!(names(&high_sierra), vec!["nightshift"]);

            assert!(resolver
                .resolve("CoreBrightness", &OsVersion::new(10, 12, 3))
                .is_empty());
        }

        #[test]
        fn test_airplay_extended_matches_both_mac_mini_spellings() {
            let catalog = embedded_catalog().unwrap();
            let (_, rule) = catalog.rule("airplay_extended_models").unwrap();
            let needle = rule.needle().to_vec();

            for suffix in [&b"Mini8,1\0"[..], &b"mini8,1\0"[..]] {
                let mut image = needle.clone();
                image.extend_from_slice(suffix);
                let report = PatchSession::new(&catalog, "AirPlaySupport", OsVersion::new(12, 3, 0))
                    .with_features([FeatureTag::AirPlayExtendedModel])
                    .run(&mut image)
                    .unwrap();
                assert_eq!(report.patched_occurrences(), 1);
                assert!(image.ends_with(suffix));
                assert_eq!(&image[needle.len() - 3..needle.len()], b"Nac");
            }
        }
    }
}
