//! dyldpatch-engine 内核错误定义
//! 封装内核层所有核心错误，与业务层错误解耦，基于thiserror实现类型安全处理
use thiserror::Error;

/// 规则目录配置错误
/// 全部属于致命错误：出现任意一条即拒绝构建规则目录
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 查找/替换字节长度不一致（等长替换是镜像不被破坏的前提）
    #[error("Rule [{rule_id}] length mismatch: needle {needle_len} bytes, replacement {replacement_len} bytes")]
    LengthMismatch {
        rule_id: String,
        needle_len: usize,
        replacement_len: usize,
    },

    /// 查找字节为空
    #[error("Rule [{rule_id}] has an empty needle")]
    EmptyNeedle { rule_id: String },

    /// 规则ID在整个目录中重复
    #[error("Duplicate rule id: {0}")]
    DuplicateRuleId(String),

    /// 规则集名称重复
    #[error("Duplicate rule set: {0}")]
    DuplicateRuleSet(String),

    /// 规则集内没有任何规则
    #[error("Rule set [{0}] contains no rules")]
    EmptyRuleSet(String),

    /// 规则所属功能与规则集功能不一致
    #[error("Rule [{rule_id}] feature {rule_feature} differs from rule set [{rule_set}] feature {set_feature}")]
    FeatureMismatch {
        rule_id: String,
        rule_set: String,
        rule_feature: String,
        set_feature: String,
    },

    /// 声明式字节描述无法解析
    #[error("Rule [{rule_id}] has invalid bytes: {reason}")]
    InvalidBytes { rule_id: String, reason: String },
}

/// 内核核心错误枚举
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================== 规则相关错误 =====================
    /// 规则目录校验失败（不可恢复，拒绝初始化）
    #[error("Rule catalog rejected: {0}")]
    Config(#[from] ConfigError),

    /// 规则表解析失败（JSON格式/字段错误）
    #[error("Rule parse failed: {0}")]
    RuleParseError(String),

    // ===================== 补丁相关错误 =====================
    /// 镜像在匹配位置不可写
    /// 已写入的匹配保持不变，found/patched 记录中断时的进度
    #[error("Access denied at offset {offset:#x} while applying rule [{rule_id}] ({patched}/{found} patched)")]
    AccessDenied {
        rule_id: String,
        offset: usize,
        found: usize,
        patched: usize,
    },

    /// 镜像实现返回了其他写入错误，进度语义同 AccessDenied
    #[error("Write failed at offset {offset:#x} while applying rule [{rule_id}] ({patched}/{found} patched): {reason}")]
    WriteFailed {
        rule_id: String,
        offset: usize,
        found: usize,
        patched: usize,
        reason: String,
    },

    // ===================== 基础错误 =====================
    /// 系统版本字符串无法解析
    #[error("Invalid OS version: {0}")]
    InvalidVersion(String),

    /// 无效输入参数
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::RuleParseError(err.to_string())
    }
}

/// 内核层全局Result类型别名
pub type CoreResult<T> = Result<T, CoreError>;
