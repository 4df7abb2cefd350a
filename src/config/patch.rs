//! 全局补丁配置管理

use dyldpatch_engine::FeatureTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// 启动参数中的框架开关 → 目标镜像名
const SIDECAR_TARGET: &str = "SidecarCore";
const AIRPLAY_TARGET: &str = "AirPlaySupport";
const NIGHTSHIFT_TARGET: &str = "CoreBrightness";

/// 规则目录来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOrigin {
    Embedded,           // 内置规则表（编译期 embed）
    LocalFile(PathBuf), // 本地 JSON 规则表（运行时）
}

/// 功能开关
/// 默认开启机型放行类补丁；iPad 放行与虚拟机检测绕过需显式开启
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub sidecar_airplay: bool,
    pub sidecar_ipad: bool,
    pub airplay_extended: bool,
    pub airplay_vmm: bool,
    pub nightshift: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            sidecar_airplay: true,
            sidecar_ipad: false,
            airplay_extended: true,
            airplay_vmm: false,
            nightshift: true,
        }
    }
}

impl FeatureToggles {
    /// 全部开启
    pub fn all() -> Self {
        Self {
            sidecar_airplay: true,
            sidecar_ipad: true,
            airplay_extended: true,
            airplay_vmm: true,
            nightshift: true,
        }
    }

    /// 全部关闭
    pub fn none() -> Self {
        Self {
            sidecar_airplay: false,
            sidecar_ipad: false,
            airplay_extended: false,
            airplay_vmm: false,
            nightshift: false,
        }
    }

    fn slot(&mut self, feature: FeatureTag) -> &mut bool {
        match feature {
            FeatureTag::SidecarAirPlayModel => &mut self.sidecar_airplay,
            FeatureTag::SidecarIpadModel => &mut self.sidecar_ipad,
            FeatureTag::AirPlayExtendedModel => &mut self.airplay_extended,
            FeatureTag::AirPlayVmm => &mut self.airplay_vmm,
            FeatureTag::NightShiftFloor => &mut self.nightshift,
        }
    }

    pub fn is_enabled(&self, feature: FeatureTag) -> bool {
        let mut toggles = *self;
        *toggles.slot(feature)
    }

    pub fn set(&mut self, feature: FeatureTag, enabled: bool) {
        *self.slot(feature) = enabled;
    }

    /// 已开启的功能（FeatureTag 声明顺序）
    pub fn enabled(&self) -> Vec<FeatureTag> {
        FeatureTag::ALL
            .iter()
            .copied()
            .filter(|feature| self.is_enabled(*feature))
            .collect()
    }
}

/// 完整补丁配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchConfig {
    pub origin: CatalogOrigin,
    pub features: FeatureToggles,
    /// 整体跳过的目标镜像（按镜像名，与功能开关独立）
    pub disabled_targets: BTreeSet<String>,
    /// 逐条输出补丁结果
    pub verbose: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            origin: CatalogOrigin::Embedded,
            features: FeatureToggles::default(),
            disabled_targets: BTreeSet::new(),
            verbose: false,
        }
    }
}

impl PatchConfig {
    /// 内置规则表
    pub fn embedded() -> Self {
        Self::default()
    }

    /// 本地规则表文件
    pub fn local_file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: CatalogOrigin::LocalFile(path.into()),
            ..Self::default()
        }
    }

    pub fn disable_target(&mut self, target_name: impl Into<String>) {
        self.disabled_targets.insert(target_name.into());
    }

    pub fn is_target_enabled(&self, target_name: &str) -> bool {
        !self.disabled_targets.contains(target_name)
    }

    /// 目标镜像实际生效的功能，目标被禁用时为空
    pub fn features_for(&self, target_name: &str) -> Vec<FeatureTag> {
        if self.is_target_enabled(target_name) {
            self.features.enabled()
        } else {
            Vec::new()
        }
    }

    /// 按启动参数风格的开关串调整配置，未知参数忽略
    /// - -dyldpatch_disable_sidecar / _airplay / _nightshift：跳过对应框架镜像的全部补丁
    /// - -dyldpatch_allow_ipad / -dyldpatch_vmm：开启对应功能
    /// - -dyldpatch_off：关闭全部功能
    pub fn apply_flags(&mut self, flags: &str) {
        for flag in flags.split_whitespace() {
            match flag {
                "-dyldpatch_off" => self.features = FeatureToggles::none(),
                "-dyldpatch_disable_sidecar" => self.disable_target(SIDECAR_TARGET),
                "-dyldpatch_disable_airplay" => self.disable_target(AIRPLAY_TARGET),
                "-dyldpatch_disable_nightshift" => self.disable_target(NIGHTSHIFT_TARGET),
                "-dyldpatch_allow_ipad" => self.features.sidecar_ipad = true,
                "-dyldpatch_vmm" => self.features.airplay_vmm = true,
                other => {
                    log::trace!("Ignoring unknown flag: {}", other);
                    continue;
                }
            }
            log::debug!("Applied flag {}", flag);
        }
    }
}

/// 自定义构建器（链式 API）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: PatchConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origin(mut self, origin: CatalogOrigin) -> Self {
        self.config.origin = origin;
        self
    }

    pub fn features(mut self, features: FeatureToggles) -> Self {
        self.config.features = features;
        self
    }

    pub fn enable(mut self, feature: FeatureTag) -> Self {
        self.config.features.set(feature, true);
        self
    }

    pub fn disable(mut self, feature: FeatureTag) -> Self {
        self.config.features.set(feature, false);
        self
    }

    pub fn disable_target(mut self, target_name: impl Into<String>) -> Self {
        self.config.disable_target(target_name);
        self
    }

    pub fn flags(mut self, flags: &str) -> Self {
        self.config.apply_flags(flags);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> PatchConfig {
        self.config
    }
}
