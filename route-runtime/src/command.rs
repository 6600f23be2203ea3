//! # Command 模块
//!
//! 定义 Runtime 向 Host 发出的所有指令。
//! Command 是 Runtime 与 Host 之间的**唯一通信方式**。
//!
//! ## 设计原则
//!
//! - **声明式**：Command 描述"做什么"，不描述"怎么做"
//! - **无副作用**：Command 本身不执行任何操作
//! - **引擎无关**：资源以创作数据中的引用字符串表示，由 Host 解释

use serde::{Deserialize, Serialize};

use crate::script::Choice;

/// 二维向量（位置 / 缩放）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Runtime 向 Host 发出的指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // ===== 文本 =====
    /// 设置说话者（None 表示旁白）
    SetSpeaker { speaker: Option<String> },

    /// 设置当前可见文本
    ///
    /// 内容可能包含 `<...>` 标记，Host 负责解释。
    SetText { content: String },

    /// 设置文本不透明度（0.0 - 1.0）
    SetTextOpacity { alpha: f32 },

    // ===== 分支 =====
    /// 显示选择分支
    PresentChoices {
        /// Route 的提问文本
        question: Option<String>,
        /// 选项列表
        choices: Vec<Choice>,
    },

    /// 移除选择界面
    ClearChoices,

    /// 进入 Route
    EnterRoute { route: String },

    /// 剧情结束（每次播放只发出一次）
    RouteEnded { route: String },

    // ===== 背景 =====
    /// 立即切换背景
    SetBackground { path: String },

    /// 交叉淡化到新背景
    CrossFadeBackground { path: String, duration: f32 },

    // ===== 音频 =====
    /// 播放背景音乐
    PlayBgm {
        path: String,
        volume: f32,
        looping: bool,
    },

    /// 设置背景音乐音量
    SetBgmVolume { volume: f32 },

    /// 停止背景音乐
    StopBgm,

    /// 播放音效
    PlaySfx {
        path: String,
        volume: f32,
        looping: bool,
    },

    /// 设置音效音量
    SetSfxVolume { volume: f32 },

    /// 停止音效
    StopSfx,

    // ===== 角色 =====
    /// 设置角色立绘
    SetCharacterSprite { name: String, path: String },

    /// 设置角色位置与缩放
    SetCharacterTransform {
        name: String,
        position: Vec2,
        scale: Vec2,
    },

    /// 设置角色可见性
    SetCharacterVisible { name: String, visible: bool },

    /// 设置角色不透明度（0.0 - 1.0）
    SetCharacterAlpha { name: String, alpha: f32 },

    /// 移除角色
    RemoveCharacter { name: String },
}

impl Command {
    /// 指令涉及的角色名
    pub fn character(&self) -> Option<&str> {
        match self {
            Self::SetCharacterSprite { name, .. }
            | Self::SetCharacterTransform { name, .. }
            | Self::SetCharacterVisible { name, .. }
            | Self::SetCharacterAlpha { name, .. }
            | Self::RemoveCharacter { name } => Some(name.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization() {
        let cmd = Command::PlayBgm {
            path: "bgm/theme.ogg".to_string(),
            volume: 0.5,
            looping: true,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let loaded: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, cmd);
    }

    #[test]
    fn test_command_queries() {
        let cmd = Command::SetCharacterAlpha {
            name: "Ann".to_string(),
            alpha: 0.5,
        };
        assert_eq!(cmd.character(), Some("Ann"));
        assert_eq!(Command::ClearChoices.character(), None);
    }
}
