//! 线性时钟

use serde::{Deserialize, Serialize};

use crate::config::{is_instant, sanitize_duration};

/// 固定时长的线性进度
///
/// 由 `advance(dt)` 显式推进，不读取真实时间。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeClock {
    elapsed: f32,
    duration: f32,
}

impl FadeClock {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration: sanitize_duration(duration),
        }
    }

    /// 推进时钟，返回新的进度
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + sanitize_duration(dt)).min(self.duration);
        self.progress()
    }

    /// 当前进度（0.0 - 1.0）
    pub fn progress(&self) -> f32 {
        if is_instant(self.duration) {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_progress() {
        let mut clock = FadeClock::new(1.0);
        assert_eq!(clock.progress(), 0.0);
        assert_eq!(clock.advance(0.25), 0.25);
        assert!(!clock.is_finished());
        assert_eq!(clock.advance(10.0), 1.0);
        assert!(clock.is_finished());
    }

    #[test]
    fn test_zero_duration_is_finished() {
        let clock = FadeClock::new(0.0);
        assert!(clock.is_finished());
        let clock = FadeClock::new(-2.0);
        assert!(clock.is_finished());
    }

    #[test]
    fn test_invalid_dt_ignored() {
        let mut clock = FadeClock::new(1.0);
        clock.advance(-1.0);
        clock.advance(f32::NAN);
        assert_eq!(clock.progress(), 0.0);
        assert!(!clock.is_finished());
    }
}
