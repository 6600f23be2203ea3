//! # State 模块
//!
//! 定义 Runtime 的运行时状态和等待模型。
//!
//! ## 设计原则
//!
//! - 所有状态必须**显式建模**
//! - 所有状态必须**可序列化**
//! - 不允许隐式全局状态：计时全部由 `tick(dt)` 推进

use serde::{Deserialize, Serialize};

use crate::presentation::{FadeClock, TextPresenter};

/// 等待原因
///
/// Host 根据此状态决定如何采集输入。
///
/// # 状态转换
///
/// ```text
/// WaitForClick      -> 收到 Advance 后显示下一句（或进入选择 / 切换 Route）
/// WaitForChoice     -> 收到 SelectChoice 后切换到目标 Route
/// WaitForTransition -> 背景过渡中，Advance 被忽略，tick 推进到结束
/// Ended             -> 剧情结束，只响应 Reset
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitingReason {
    /// 等待用户点击
    WaitForClick,

    /// 等待用户选择
    ///
    /// `choice_count` 记录选项数量，用于验证输入合法性
    WaitForChoice { choice_count: usize },

    /// 等待背景过渡结束
    WaitForTransition,

    /// 剧情结束
    Ended,
}

impl WaitingReason {
    /// 创建等待选择状态
    pub fn choice(count: usize) -> Self {
        Self::WaitForChoice {
            choice_count: count,
        }
    }
}

/// 导航模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// 逐句阅读
    #[default]
    Reading,
    /// 选择中
    Choosing { choice_count: usize },
    /// 已结束
    Ended,
}

/// 当前位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePosition {
    /// 当前 Route id
    pub route: String,
    /// 下一句要显示的台词下标
    pub line_index: usize,
}

impl RoutePosition {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            line_index: 0,
        }
    }
}

/// 背景状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundState {
    /// 当前背景引用
    pub current: Option<String>,
    /// 交叉淡化时钟，存在时阻止推进
    pub fade: Option<FadeClock>,
}

impl BackgroundState {
    pub fn is_transitioning(&self) -> bool {
        self.fade.is_some()
    }

    /// 推进过渡，返回本次是否结束
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(clock) = self.fade.as_mut() else {
            return false;
        };
        clock.advance(dt);
        if clock.is_finished() {
            self.fade = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.fade = None;
    }
}

/// 音频状态
///
/// 记录已发出的播放指令，而不是设备的实际状态。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioState {
    /// 循环播放中的 BGM，同一曲目再次请求时不重新开始
    pub bgm: Option<String>,
    /// 音效可能仍在播放，下一句显示前会被停止
    pub sfx_active: bool,
}

impl AudioState {
    /// 是否应当为这次请求重新播放 BGM
    pub fn should_play_bgm(&self, path: &str, start_over: bool) -> bool {
        start_over || self.bgm.as_deref() != Some(path)
    }

    /// 取出待停止的音效标记
    pub fn take_sfx(&mut self) -> bool {
        std::mem::take(&mut self.sfx_active)
    }
}

/// 播放状态
///
/// 一次播放会话的全部可变状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub position: RoutePosition,
    pub mode: PlaybackMode,
    pub text: TextPresenter,
    pub background: BackgroundState,
    #[serde(default)]
    pub audio: AudioState,
    /// 已显示台词的累计序号（单调递增，重置不清零）
    #[serde(default)]
    pub line_serial: u64,
}

impl PlaybackState {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            position: RoutePosition::new(route),
            mode: PlaybackMode::Reading,
            text: TextPresenter::new(),
            background: BackgroundState::default(),
            audio: AudioState::default(),
            line_serial: 0,
        }
    }

    /// 对外的等待原因
    ///
    /// 背景过渡优先于其他状态。
    pub fn waiting(&self) -> WaitingReason {
        if self.background.is_transitioning() {
            return WaitingReason::WaitForTransition;
        }
        match self.mode {
            PlaybackMode::Reading => WaitingReason::WaitForClick,
            PlaybackMode::Choosing { choice_count } => WaitingReason::choice(choice_count),
            PlaybackMode::Ended => WaitingReason::Ended,
        }
    }

    pub fn is_choosing(&self) -> bool {
        matches!(self.mode, PlaybackMode::Choosing { .. })
    }

    pub fn is_ended(&self) -> bool {
        self.mode == PlaybackMode::Ended
    }
}
