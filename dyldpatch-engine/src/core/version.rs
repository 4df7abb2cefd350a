use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// 系统版本号解析正则
/// 支持：13 / 12.3 / 10.13.1 / 12.3 (21E5206e)，括号内构建号忽略
static OS_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?\s*(?:\(\s*[0-9A-Za-z]+\s*\))?\s*$")
        .expect("static OS version regex")
});

/// 操作系统版本（主.次.修订），按字段字典序全序比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OsVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl OsVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// 解析版本字符串，缺省的次版本/修订号按0处理
    pub fn parse(input: &str) -> CoreResult<Self> {
        let caps = OS_VERSION_RE
            .captures(input)
            .ok_or_else(|| CoreError::InvalidVersion(input.to_string()))?;

        let field = |idx: usize| -> CoreResult<u32> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse::<u32>()
                    .map_err(|_| CoreError::InvalidVersion(input.to_string())),
                None => Ok(0),
            }
        };

        Ok(Self::new(field(1)?, field(2)?, field(3)?))
    }
}

impl FromStr for OsVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for OsVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

/// 以 "主.次[.修订]" 字符串形式序列化
impl Serialize for OsVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 版本适用区间：since 包含，until 不包含，None 表示不限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionRange {
    pub since: Option<OsVersion>,
    pub until: Option<OsVersion>,
}

impl VersionRange {
    /// 不限版本
    pub const fn any() -> Self {
        Self {
            since: None,
            until: None,
        }
    }

    pub const fn since(version: OsVersion) -> Self {
        Self {
            since: Some(version),
            until: None,
        }
    }

    pub const fn between(since: OsVersion, until: OsVersion) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
        }
    }

    /// 从可选的版本字符串构建区间
    pub fn parse(since: Option<&str>, until: Option<&str>) -> CoreResult<Self> {
        let since = since.map(OsVersion::parse).transpose()?;
        let until = until.map(OsVersion::parse).transpose()?;
        if let (Some(lo), Some(hi)) = (since, until) {
            if lo >= hi {
                return Err(CoreError::InvalidVersion(format!(
                    "empty version range [{}, {})",
                    lo, hi
                )));
            }
        }
        Ok(Self { since, until })
    }

    #[inline]
    pub fn contains(&self, version: &OsVersion) -> bool {
        self.since.map_or(true, |lo| *version >= lo) && self.until.map_or(true, |hi| *version < hi)
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.since, self.until) {
            (None, None) => f.write_str("any"),
            (Some(lo), None) => write!(f, ">= {}", lo),
            (None, Some(hi)) => write!(f, "< {}", hi),
            (Some(lo), Some(hi)) => write!(f, "[{}, {})", lo, hi),
        }
    }
}
