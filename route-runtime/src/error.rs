//! # Error 模块
//!
//! 定义 route-runtime 中使用的错误类型。
//!
//! - [`ContentError`]：加载期致命错误，脚本无法开始播放
//! - [`EventParameterError`]：事件参数错误，加载期就地恢复（跳过或降级）
//! - [`RuntimeError`]：运行期可恢复错误，调用方记录后继续

use thiserror::Error;

use crate::script::AssetKind;

/// 内容错误
///
/// 脚本结构本身不完整，播放无法开始。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    /// 脚本文本不是合法的 JSON 结构
    #[error("脚本 '{script}' 格式无效 - {message}")]
    InvalidFormat { script: String, message: String },

    /// 脚本没有任何 Route
    #[error("脚本 '{script}' 不包含任何 Route")]
    EmptyScript { script: String },

    /// Route id 为空
    #[error("脚本 '{script}' 第 {index} 个 Route 缺少 id")]
    MissingRouteId { script: String, index: usize },

    /// Route id 重复
    #[error("Route '{route}' 重复定义")]
    DuplicateRoute { route: String },

    /// 起始 Route 不存在
    #[error("起始 Route '{route}' 不存在")]
    MissingStartRoute { route: String },

    /// Route 引用了不存在的目标
    #[error("Route '{from}' 引用了不存在的 Route '{target}'")]
    DanglingRoute { from: String, target: String },
}

/// 事件参数错误
///
/// 参数数量或类型不符合指令签名。加载器据此跳过事件或降级为低元形式。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventParameterError {
    /// 未知指令
    #[error("未知指令 '{command}'")]
    UnknownCommand { command: String },

    /// 缺少必需参数
    #[error("指令 '{command}' 缺少参数 '{param}'")]
    MissingParameter {
        command: String,
        param: &'static str,
    },

    /// 参数值无法解析
    #[error("指令 '{command}' 的参数 '{param}' 无效：'{value}' 不是 {expected}")]
    InvalidParameter {
        command: String,
        param: &'static str,
        value: String,
        expected: &'static str,
    },

    /// 多余参数
    #[error("指令 '{command}' 忽略多余参数 {extra:?}")]
    ExtraParameters { command: String, extra: Vec<String> },
}

/// 运行时错误
///
/// 全部可恢复：操作不生效，状态保持不变。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 当前不在选择模式
    #[error("当前不在选择状态，无法选择选项")]
    NotInChoiceMode,

    /// 无效的选择索引
    #[error("无效的选择索引 {index}，有效范围是 0..{max}")]
    InvalidChoiceIndex { index: usize, max: usize },

    /// 角色未登场
    #[error("角色 '{name}' 不在舞台上")]
    UnknownCharacter { name: String },

    /// 资源索引越界
    #[error("{kind}资源索引 {index} 越界（共 {len} 项）")]
    AssetIndexOutOfRange {
        kind: AssetKind,
        index: usize,
        len: usize,
    },

    /// Route 未找到
    #[error("Route '{route}' 未找到")]
    RouteNotFound { route: String },
}
