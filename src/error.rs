//! 全局错误类型定义
use dyldpatch_engine::CoreError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DyldPatchError {
    // 引擎错误（规则校验/补丁写入/版本解析）
    #[error("{0}")]
    Core(#[from] CoreError),

    // 规则相关错误
    #[error("规则加载失败：{0}")]
    RuleLoadError(String),

    // 补丁器相关错误
    #[error("补丁器未初始化: {0}")]
    CatalogNotInitialized(String),
    #[error("补丁器初始化失败: {0}")]
    CatalogInitError(String),
    #[error("特性未启用：{0}")]
    FeatureDisabled(String),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

// 全局Result类型
pub type DyldResult<T> = Result<T, DyldPatchError>;
