//! # Config 模块
//!
//! Runtime 的可调参数。
//!
//! 所有字段都有默认值，Host 可以只写需要覆盖的部分：
//!
//! ```json
//! { "typewriter_delay": 0.02 }
//! ```

use serde::{Deserialize, Serialize};

/// 时长阈值（秒）
///
/// 小于等于该值的时长视为“瞬间完成”。
pub const DURATION_EPSILON: f32 = 1e-4;

/// 默认历史记录容量
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// Runtime 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 打字机默认逐字间隔（秒），台词未指定 duration 时使用
    #[serde(default = "default_typewriter_delay")]
    pub typewriter_delay: f32,

    /// 角色立绘切换的淡出/淡入时长（秒），0 表示立即切换
    #[serde(default = "default_character_fade")]
    pub character_fade: f32,

    /// 历史记录容量
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_typewriter_delay() -> f32 {
    0.04
}

fn default_character_fade() -> f32 {
    0.25
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            typewriter_delay: default_typewriter_delay(),
            character_fade: default_character_fade(),
            history_capacity: default_history_capacity(),
        }
    }
}

impl RuntimeConfig {
    /// 关闭所有默认动画（测试与无头环境常用）
    pub fn instant() -> Self {
        Self {
            typewriter_delay: 0.0,
            character_fade: 0.0,
            ..Self::default()
        }
    }

    /// 将非法值修正为可用值
    ///
    /// 负数或非有限时长按 0 处理，容量至少为 1。
    pub fn sanitized(mut self) -> Self {
        self.typewriter_delay = sanitize_duration(self.typewriter_delay);
        self.character_fade = sanitize_duration(self.character_fade);
        self.history_capacity = self.history_capacity.max(1);
        self
    }
}

/// 负数或非有限时长按 0 处理
pub fn sanitize_duration(seconds: f32) -> f32 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// 时长是否视为瞬间
pub fn is_instant(seconds: f32) -> bool {
    seconds <= DURATION_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.typewriter_delay, 0.04);
        assert_eq!(config.character_fade, 0.25);
        assert_eq!(config.history_capacity, 500);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RuntimeConfig = serde_json::from_str(r#"{ "character_fade": 0 }"#).unwrap();
        assert_eq!(config.character_fade, 0.0);
        assert_eq!(config.typewriter_delay, 0.04);
    }

    #[test]
    fn test_sanitized() {
        let config = RuntimeConfig {
            typewriter_delay: -1.0,
            character_fade: f32::NAN,
            history_capacity: 0,
        }
        .sanitized();
        assert_eq!(config.typewriter_delay, 0.0);
        assert_eq!(config.character_fade, 0.0);
        assert_eq!(config.history_capacity, 1);
    }

    #[test]
    fn test_is_instant() {
        assert!(is_instant(0.0));
        assert!(is_instant(-3.0));
        assert!(!is_instant(0.01));
    }
}
