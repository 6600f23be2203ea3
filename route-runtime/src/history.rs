//! # History 模块
//!
//! 回看记录：显示过的台词、做出的选择、进入的 Route。
//!
//! 不记录过渡动画等临时状态。容量有上限，超出时丢弃最早的记录。

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// 回看条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryEvent {
    /// 显示过的台词
    Dialogue {
        speaker: Option<String>,
        /// 完整文本（追加模式下包含前缀）
        content: String,
        timestamp: u64,
    },

    /// 做出的选择
    ChoiceMade {
        /// 当时呈现的全部选项
        options: Vec<String>,
        selected_index: usize,
        timestamp: u64,
    },

    /// 进入 Route
    RouteChange { route: String, timestamp: u64 },
}

impl HistoryEvent {
    pub fn dialogue(speaker: Option<String>, content: impl Into<String>) -> Self {
        Self::Dialogue {
            speaker,
            content: content.into(),
            timestamp: unix_now(),
        }
    }

    pub fn choice_made(options: Vec<String>, selected_index: usize) -> Self {
        Self::ChoiceMade {
            options,
            selected_index,
            timestamp: unix_now(),
        }
    }

    pub fn route_change(route: impl Into<String>) -> Self {
        Self::RouteChange {
            route: route.into(),
            timestamp: unix_now(),
        }
    }

    /// Unix 秒
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Dialogue { timestamp, .. }
            | Self::ChoiceMade { timestamp, .. }
            | Self::RouteChange { timestamp, .. } => *timestamp,
        }
    }

    /// 台词条目的 `(说话者, 文本)`
    pub fn as_line(&self) -> Option<(Option<&str>, &str)> {
        match self {
            Self::Dialogue {
                speaker, content, ..
            } => Some((speaker.as_deref(), content.as_str())),
            _ => None,
        }
    }
}

/// 回看记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    entries: VecDeque<HistoryEvent>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// 容量至少为 1
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.clamp(1, 64)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, event: HistoryEvent) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    /// 按时间顺序遍历
    pub fn events(&self) -> impl DoubleEndedIterator<Item = &HistoryEvent> {
        self.entries.iter()
    }

    pub fn line_count(&self) -> usize {
        self.events().filter_map(HistoryEvent::as_line).count()
    }

    /// 最近 `count` 句台词，按时间顺序
    pub fn recent_lines(&self, count: usize) -> Vec<(Option<&str>, &str)> {
        let mut lines: Vec<_> = self
            .entries
            .iter()
            .rev()
            .filter_map(HistoryEvent::as_line)
            .take(count)
            .collect();
        lines.reverse();
        lines
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
