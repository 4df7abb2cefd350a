//! 声明式规则表
//! 规则以数据行描述，由同一套通用扫描/替换算法驱动：
//! JSON → CatalogDefinition → (VerifyGate) → RuleCatalog

use serde::{Deserialize, Serialize};

use crate::catalog::{RuleCatalog, RuleCatalogBuilder};
use crate::core::{FeatureTag, RuleScope, VersionRange};
use crate::error::{ConfigError, CoreResult};

/// 字节序列描述
/// - `{"text": "iMac13,1\u0000"}`：UTF-8 字节原样
/// - `{"hex": "69 4D 0x61,63"}`：空白/逗号分隔的十六进制，可带 0x 前缀
/// - `{"u32_le": [9, 13]}`：小端 32 位整数表
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ByteSpec {
    Text { text: String },
    Hex { hex: String },
    U32Le { u32_le: Vec<u32> },
}

impl ByteSpec {
    /// 解析为字节序列，rule_id 仅用于错误定位
    pub fn to_bytes(&self, rule_id: &str) -> Result<Vec<u8>, ConfigError> {
        match self {
            ByteSpec::Text { text } => Ok(text.as_bytes().to_vec()),
            ByteSpec::Hex { hex } => parse_hex(hex).map_err(|reason| ConfigError::InvalidBytes {
                rule_id: rule_id.to_string(),
                reason,
            }),
            ByteSpec::U32Le { u32_le } => Ok(u32_le.iter().flat_map(|v| v.to_le_bytes()).collect()),
        }
    }

    /// 统一转为十六进制描述（大写、无分隔）
    pub fn from_bytes(bytes: &[u8]) -> Self {
        ByteSpec::Hex {
            hex: hex::encode_upper(bytes),
        }
    }
}

/// 十六进制文本解析：去掉空白/逗号分隔与 0x 前缀后交给 hex 解码
fn parse_hex(input: &str) -> Result<Vec<u8>, String> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();

    hex::decode(&digits).map_err(|e: hex::FromHexError| e.to_string())
}

/// 单条规则定义
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleDefinition {
    pub id: String,
    pub find: ByteSpec,
    pub replace: ByteSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// 规则集定义
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleSetDefinition {
    pub name: String,
    pub feature: FeatureTag,
    pub targets: Vec<String>,
    /// 起始版本（包含）
    #[serde(default)]
    pub since: Option<String>,
    /// 截止版本（不包含）
    #[serde(default)]
    pub until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rules: Vec<RuleDefinition>,
}

impl RuleSetDefinition {
    pub fn scope(&self) -> CoreResult<RuleScope> {
        let versions = VersionRange::parse(self.since.as_deref(), self.until.as_deref())?;
        Ok(RuleScope::new(self.targets.iter().cloned(), versions))
    }
}

/// 完整规则表定义
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct CatalogDefinition {
    pub rule_sets: Vec<RuleSetDefinition>,
}

impl CatalogDefinition {
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// 紧凑 JSON 输出
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 规范化：全部字节描述转为十六进制，便于嵌入与比对
    pub fn normalized(&self) -> CoreResult<Self> {
        let mut normalized = self.clone();
        for set in &mut normalized.rule_sets {
            for rule in &mut set.rules {
                rule.find = ByteSpec::from_bytes(&rule.find.to_bytes(&rule.id)?);
                rule.replace = ByteSpec::from_bytes(&rule.replace.to_bytes(&rule.id)?);
            }
        }
        Ok(normalized)
    }

    /// 解析字节描述与版本区间，经 VerifyGate 校验后构建目录
    pub fn build(&self) -> CoreResult<RuleCatalog> {
        let mut builder = RuleCatalogBuilder::new();
        for set in &self.rule_sets {
            builder = builder.rule_set(set.name.clone(), set.feature, set.scope()?);
            if let Some(description) = &set.description {
                builder = builder.description(description.clone());
            }
            for rule in &set.rules {
                builder = builder.rule(
                    rule.id.clone(),
                    rule.find.to_bytes(&rule.id)?,
                    rule.replace.to_bytes(&rule.id)?,
                );
            }
        }

        let catalog = builder.build()?;
        log::debug!(
            "Declarative catalog built: {} rule set(s), {} rule(s)",
            catalog.len(),
            catalog.rule_count()
        );
        Ok(catalog)
    }
}
