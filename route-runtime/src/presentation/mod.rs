//! # Presentation 模块
//!
//! 文本呈现状态机。
//!
//! ## 状态
//!
//! ```text
//! Idle ──display──> Typewriter / FadeIn ──tick 完成──> Idle
//!   │                     ▲
//!   └──display（上一句带 FadeOut）──> FadeOut ──tick 完成──┘
//! ```
//!
//! 任意时刻调用 [`TextPresenter::complete_active_transition`] 都会立刻回到 Idle，
//! 文本显示为最终内容、不透明度为 1。
//!
//! ## 追加模式
//!
//! `additive` 台词以“已提交文本”为前缀。`display` 时已提交文本立即更新为完整目标文本，
//! 所以即使上一句还在逐字显示，下一句追加的也是完整内容。

pub mod fade;
pub mod markup;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::config::{is_instant, sanitize_duration};
use crate::script::{DialogueLine, OutroEffect, TextEffect};

pub use fade::FadeClock;

/// 等待呈现的台词
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingLine {
    speaker: Option<String>,
    base: String,
    content: String,
    effect: TextEffect,
    /// 已解析的时长：打字机为逐字间隔，淡入为总时长
    duration: f32,
}

impl PendingLine {
    fn target(&self) -> String {
        format!("{}{}", self.base, self.content)
    }
}

/// 逐字显示进度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypewriterProgress {
    base: String,
    content: String,
    cuts: Vec<usize>,
    revealed: usize,
    delay: f32,
    elapsed: f32,
}

impl TypewriterProgress {
    fn glyphs(&self) -> usize {
        self.cuts.len().saturating_sub(1)
    }

    fn visible(&self) -> String {
        let cut = self
            .cuts
            .get(self.revealed)
            .copied()
            .unwrap_or(self.content.len());
        let shown = self.content.get(..cut).unwrap_or(&self.content);
        format!("{}{}", self.base, shown)
    }

    fn target(&self) -> String {
        format!("{}{}", self.base, self.content)
    }
}

/// 进行中的文本过渡
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextTransition {
    Typewriter(TypewriterProgress),
    FadeIn { clock: FadeClock },
    /// 旧文本淡出，结束后开始呈现 `next`
    FadeOut { clock: FadeClock, next: PendingLine },
}

/// 过渡类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Typewriter,
    FadeIn,
    FadeOut,
}

impl TextTransition {
    pub fn kind(&self) -> TransitionKind {
        match self {
            Self::Typewriter(_) => TransitionKind::Typewriter,
            Self::FadeIn { .. } => TransitionKind::FadeIn,
            Self::FadeOut { .. } => TransitionKind::FadeOut,
        }
    }
}

/// 文本呈现器
///
/// 持有文本区的全部状态，每个操作都返回需要 Host 执行的 [`Command`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPresenter {
    speaker: Option<String>,
    /// 已提交文本（追加模式的前缀）
    committed: String,
    visible: String,
    opacity: f32,
    /// 当前台词的退场效果
    outro: OutroEffect,
    transition: Option<TextTransition>,
}

impl Default for TextPresenter {
    fn default() -> Self {
        Self {
            speaker: None,
            committed: String::new(),
            visible: String::new(),
            opacity: 1.0,
            outro: OutroEffect::Normal,
            transition: None,
        }
    }
}

impl TextPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 显示一句台词
    ///
    /// 先完成进行中的过渡，再按台词的效果开始呈现。
    /// `default_delay` 是台词未指定 duration 时的打字机间隔。
    pub fn display(&mut self, line: &DialogueLine, default_delay: f32) -> Vec<Command> {
        let mut out = Vec::new();
        self.complete_into(&mut out);

        let base = if line.additive {
            self.committed.clone()
        } else {
            String::new()
        };
        let duration = match line.effect {
            TextEffect::Typewriter => line.duration.unwrap_or(default_delay),
            TextEffect::FadeIn => line.duration.unwrap_or(0.0),
            TextEffect::Normal => 0.0,
        };
        let pending = PendingLine {
            speaker: line.speaker.clone(),
            base,
            content: line.content.clone(),
            effect: line.effect,
            duration: sanitize_duration(duration),
        };
        self.committed = pending.target();

        match std::mem::replace(&mut self.outro, line.outro) {
            OutroEffect::FadeOut(seconds) if !is_instant(seconds) && !self.visible.is_empty() => {
                self.transition = Some(TextTransition::FadeOut {
                    clock: FadeClock::new(seconds),
                    next: pending,
                });
            }
            _ => self.start(pending, &mut out),
        }

        out
    }

    /// 立即完成进行中的过渡
    ///
    /// 没有过渡时不做任何事，返回空列表。
    pub fn complete_active_transition(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        self.complete_into(&mut out);
        out
    }

    /// 推进进行中的过渡
    pub fn tick(&mut self, dt: f32) -> Vec<Command> {
        let dt = sanitize_duration(dt);
        let mut out = Vec::new();
        let Some(transition) = self.transition.take() else {
            return out;
        };

        match transition {
            TextTransition::Typewriter(mut progress) => {
                progress.elapsed += dt;
                let before = progress.revealed;
                while progress.revealed < progress.glyphs() && progress.elapsed >= progress.delay {
                    progress.elapsed -= progress.delay;
                    progress.revealed += 1;
                }
                if progress.revealed != before {
                    self.set_text(progress.visible(), &mut out);
                }
                if progress.revealed < progress.glyphs() {
                    self.transition = Some(TextTransition::Typewriter(progress));
                }
            }
            TextTransition::FadeIn { mut clock } => {
                let alpha = clock.advance(dt);
                self.set_opacity(alpha, &mut out);
                if !clock.is_finished() {
                    self.transition = Some(TextTransition::FadeIn { clock });
                }
            }
            TextTransition::FadeOut { mut clock, next } => {
                let progress = clock.advance(dt);
                if clock.is_finished() {
                    self.set_opacity(0.0, &mut out);
                    self.start(next, &mut out);
                } else {
                    self.set_opacity(1.0 - progress, &mut out);
                    self.transition = Some(TextTransition::FadeOut { clock, next });
                }
            }
        }

        out
    }

    /// 清空文本区
    pub fn reset(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        self.transition = None;
        self.committed.clear();
        self.outro = OutroEffect::Normal;
        self.set_speaker(None, &mut out);
        self.set_text(String::new(), &mut out);
        self.set_opacity(1.0, &mut out);
        out
    }

    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    /// 当前可见文本
    pub fn visible_text(&self) -> &str {
        &self.visible
    }

    /// 已提交文本
    pub fn committed_text(&self) -> &str {
        &self.committed
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn transition(&self) -> Option<TransitionKind> {
        self.transition.as_ref().map(TextTransition::kind)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    fn complete_into(&mut self, out: &mut Vec<Command>) -> bool {
        let Some(transition) = self.transition.take() else {
            return false;
        };

        match transition {
            TextTransition::Typewriter(progress) => self.set_text(progress.target(), out),
            TextTransition::FadeIn { .. } => {}
            TextTransition::FadeOut { next, .. } => {
                self.set_speaker(next.speaker.clone(), out);
                self.set_text(next.target(), out);
            }
        }
        self.set_opacity(1.0, out);
        true
    }

    fn start(&mut self, line: PendingLine, out: &mut Vec<Command>) {
        self.set_speaker(line.speaker.clone(), out);

        match line.effect {
            TextEffect::Typewriter if !is_instant(line.duration) => {
                let cuts = markup::reveal_cuts(&line.content);
                if cuts.len() > 1 {
                    let progress = TypewriterProgress {
                        base: line.base,
                        content: line.content,
                        cuts,
                        revealed: 0,
                        delay: line.duration,
                        elapsed: 0.0,
                    };
                    self.set_text(progress.visible(), out);
                    self.set_opacity(1.0, out);
                    self.transition = Some(TextTransition::Typewriter(progress));
                    return;
                }
            }
            TextEffect::FadeIn if !is_instant(line.duration) => {
                self.set_text(line.target(), out);
                self.set_opacity(0.0, out);
                self.transition = Some(TextTransition::FadeIn {
                    clock: FadeClock::new(line.duration),
                });
                return;
            }
            _ => {}
        }

        self.set_text(line.target(), out);
        self.set_opacity(1.0, out);
    }

    fn set_speaker(&mut self, speaker: Option<String>, out: &mut Vec<Command>) {
        self.speaker = speaker.clone();
        out.push(Command::SetSpeaker { speaker });
    }

    fn set_text(&mut self, content: String, out: &mut Vec<Command>) {
        self.visible = content.clone();
        out.push(Command::SetText { content });
    }

    fn set_opacity(&mut self, alpha: f32, out: &mut Vec<Command>) {
        if self.opacity != alpha {
            self.opacity = alpha;
            out.push(Command::SetTextOpacity { alpha });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typewriter(content: &str, delay: f32) -> DialogueLine {
        DialogueLine::new(content).with_effect(TextEffect::Typewriter, Some(delay))
    }

    #[test]
    fn test_normal_display() {
        let mut presenter = TextPresenter::new();
        let commands = presenter.display(&DialogueLine::new("Hi").with_speaker("Ann"), 0.04);

        assert_eq!(
            commands,
            vec![
                Command::SetSpeaker {
                    speaker: Some("Ann".to_string())
                },
                Command::SetText {
                    content: "Hi".to_string()
                },
            ]
        );
        assert_eq!(presenter.visible_text(), "Hi");
        assert!(!presenter.is_transitioning());
    }

    #[test]
    fn test_additive_typewriter_reveal() {
        let mut presenter = TextPresenter::new();
        presenter.display(&DialogueLine::new("Hello"), 0.04);
        presenter.display(&typewriter("World", 0.25).additive(), 0.04);

        assert_eq!(presenter.visible_text(), "Hello");
        assert_eq!(presenter.committed_text(), "HelloWorld");
        assert_eq!(presenter.transition(), Some(TransitionKind::Typewriter));

        presenter.tick(0.25);
        assert_eq!(presenter.visible_text(), "HelloW");

        presenter.tick(0.5);
        assert_eq!(presenter.visible_text(), "HelloWor");

        let commands = presenter.tick(10.0);
        assert_eq!(
            commands,
            vec![Command::SetText {
                content: "HelloWorld".to_string()
            }]
        );
        assert!(!presenter.is_transitioning());
    }

    #[test]
    fn test_force_complete_typewriter() {
        let mut presenter = TextPresenter::new();
        presenter.display(&DialogueLine::new("Hello"), 0.04);
        presenter.display(&typewriter("World", 0.25).additive(), 0.04);
        presenter.tick(0.25);

        presenter.complete_active_transition();
        assert_eq!(presenter.visible_text(), "HelloWorld");
        assert_eq!(presenter.opacity(), 1.0);

        // 再次完成不产生任何变化
        let before = presenter.clone();
        assert!(presenter.complete_active_transition().is_empty());
        assert_eq!(presenter, before);
    }

    #[test]
    fn test_markup_never_partially_visible() {
        let mut presenter = TextPresenter::new();
        presenter.display(&typewriter("<b>AB</b>C", 0.25), 0.04);

        let mut seen = vec![presenter.visible_text().to_string()];
        while presenter.is_transitioning() {
            presenter.tick(0.25);
            seen.push(presenter.visible_text().to_string());
        }

        assert_eq!(seen, vec!["<b>", "<b>A", "<b>AB</b>", "<b>AB</b>C"]);
        for text in &seen {
            assert_eq!(text.matches('<').count(), text.matches('>').count());
        }
    }

    #[test]
    fn test_zero_delay_typewriter_is_instant() {
        let mut presenter = TextPresenter::new();
        presenter.display(&typewriter("Hello", 0.0), 0.04);
        assert_eq!(presenter.visible_text(), "Hello");
        assert!(!presenter.is_transitioning());
    }

    #[test]
    fn test_typewriter_uses_default_delay() {
        let mut presenter = TextPresenter::new();
        presenter.display(
            &DialogueLine::new("ab").with_effect(TextEffect::Typewriter, None),
            0.5,
        );
        presenter.tick(0.25);
        assert_eq!(presenter.visible_text(), "");
        presenter.tick(0.25);
        assert_eq!(presenter.visible_text(), "a");
    }

    #[test]
    fn test_fade_in() {
        let mut presenter = TextPresenter::new();
        presenter.display(
            &DialogueLine::new("Hi").with_effect(TextEffect::FadeIn, Some(1.0)),
            0.04,
        );
        assert_eq!(presenter.visible_text(), "Hi");
        assert_eq!(presenter.opacity(), 0.0);

        presenter.tick(0.5);
        assert_eq!(presenter.opacity(), 0.5);

        presenter.tick(0.5);
        assert_eq!(presenter.opacity(), 1.0);
        assert!(!presenter.is_transitioning());
    }

    #[test]
    fn test_fade_in_zero_duration_is_instant() {
        let mut presenter = TextPresenter::new();
        presenter.display(
            &DialogueLine::new("Hi").with_effect(TextEffect::FadeIn, Some(0.0)),
            0.04,
        );
        assert_eq!(presenter.opacity(), 1.0);
        assert!(!presenter.is_transitioning());
    }

    #[test]
    fn test_fade_out_outro() {
        let mut presenter = TextPresenter::new();
        presenter.display(
            &DialogueLine::new("Old").with_outro(OutroEffect::FadeOut(1.0)),
            0.04,
        );
        presenter.display(&DialogueLine::new("New").with_speaker("Ann"), 0.04);

        // 旧文本仍在，开始淡出
        assert_eq!(presenter.visible_text(), "Old");
        assert_eq!(presenter.transition(), Some(TransitionKind::FadeOut));

        presenter.tick(0.5);
        assert_eq!(presenter.opacity(), 0.5);

        presenter.tick(0.5);
        assert_eq!(presenter.visible_text(), "New");
        assert_eq!(presenter.speaker(), Some("Ann"));
        assert_eq!(presenter.opacity(), 1.0);
        assert!(!presenter.is_transitioning());
    }

    #[test]
    fn test_fade_out_force_complete() {
        let mut presenter = TextPresenter::new();
        presenter.display(
            &DialogueLine::new("Old").with_outro(OutroEffect::FadeOut(1.0)),
            0.04,
        );
        presenter.display(&typewriter("New", 0.25), 0.04);
        presenter.tick(0.5);

        presenter.complete_active_transition();
        assert_eq!(presenter.visible_text(), "New");
        assert_eq!(presenter.opacity(), 1.0);
        assert!(!presenter.is_transitioning());
    }

    #[test]
    fn test_display_completes_previous_transition() {
        let mut presenter = TextPresenter::new();
        presenter.display(&typewriter("First", 0.25), 0.04);
        let commands = presenter.display(&DialogueLine::new("Second"), 0.04);

        assert_eq!(
            commands[0],
            Command::SetText {
                content: "First".to_string()
            }
        );
        assert_eq!(presenter.visible_text(), "Second");
    }

    #[test]
    fn test_reset() {
        let mut presenter = TextPresenter::new();
        presenter.display(&typewriter("Hello", 0.25).with_speaker("Ann"), 0.04);
        presenter.reset();

        assert_eq!(presenter.visible_text(), "");
        assert_eq!(presenter.committed_text(), "");
        assert_eq!(presenter.speaker(), None);
        assert!(!presenter.is_transitioning());
    }
}
