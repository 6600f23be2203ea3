//! # Input 模块
//!
//! 定义 Host 向 Runtime 传递的输入事件。
//!
//! ## 设计说明
//!
//! - `RuntimeInput` 是 Host 采集用户操作后，传递给 Runtime 的抽象输入
//! - Runtime 不直接处理鼠标/键盘事件，只处理语义化的输入
//! - 时间流逝不属于输入，由 Host 每帧调用 `tick(dt)` 传入

use serde::{Deserialize, Serialize};

/// Host 向 Runtime 传递的输入
///
/// - `Advance`：推进（完成当前文本动画，或显示下一句）
/// - `SelectChoice`：在选择状态下选中某个选项
/// - `Reset`：回到起始 Route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeInput {
    /// 推进
    Advance,

    /// 选择选项
    ///
    /// `index` 是选项的索引（从 0 开始）
    SelectChoice { index: usize },

    /// 重新开始
    Reset,
}

impl RuntimeInput {
    /// 创建推进输入
    pub fn advance() -> Self {
        Self::Advance
    }

    /// 创建选择输入
    pub fn choice(index: usize) -> Self {
        Self::SelectChoice { index }
    }

    /// 创建重置输入
    pub fn reset() -> Self {
        Self::Reset
    }
}
