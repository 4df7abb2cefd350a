use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::CoreError;

/// 功能标签枚举，标记每个规则集解锁的功能
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureTag {
    /// Sidecar / AirPlay 机型黑名单绕过
    #[serde(rename = "sidecar_airplay_model")]
    SidecarAirPlayModel,
    /// Sidecar 旧款 iPad 机型放行
    #[serde(rename = "sidecar_ipad_model")]
    SidecarIpadModel,
    /// AirPlay to Mac 扩展机型（非 UDM 网卡）放行
    #[serde(rename = "airplay_extended_model")]
    AirPlayExtendedModel,
    /// AirPlay 虚拟机检测绕过
    #[serde(rename = "airplay_vmm")]
    AirPlayVmm,
    /// NightShift 机型能力下限调低
    #[serde(rename = "nightshift_floor")]
    NightShiftFloor,
}

impl FeatureTag {
    pub const ALL: [FeatureTag; 5] = [
        FeatureTag::SidecarAirPlayModel,
        FeatureTag::SidecarIpadModel,
        FeatureTag::AirPlayExtendedModel,
        FeatureTag::AirPlayVmm,
        FeatureTag::NightShiftFloor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureTag::SidecarAirPlayModel => "sidecar_airplay_model",
            FeatureTag::SidecarIpadModel => "sidecar_ipad_model",
            FeatureTag::AirPlayExtendedModel => "airplay_extended_model",
            FeatureTag::AirPlayVmm => "airplay_vmm",
            FeatureTag::NightShiftFloor => "nightshift_floor",
        }
    }
}

impl Display for FeatureTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown feature tag: {}", s)))
    }
}
