//! # Player 模块
//!
//! 用模拟帧时钟驱动 [`DialogueRuntime`]。
//!
//! ## 帧循环
//!
//! ```text
//! 每帧：tick(dt) → 执行 Command → 输出已显示完成的台词 → 按等待原因采集输入
//! ```
//!
//! 自动模式下，文本显示完成并停留 `auto_advance_delay` 秒后自动推进，
//! 选项按 `--choices` 依次选择，用完即停止。
//! 交互模式下从输入流读取：空行推进、数字选择、`h` 回看、`r` 重新开始、`q` 退出。

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use anyhow::Context;
use route_runtime::{Command, DialogueRuntime, RuntimeInput, WaitingReason};
use tracing::{info, warn};

use crate::config::HostConfig;
use crate::view::CommandExecutor;

/// `h` 回看时输出的台词数
const BACKLOG_LINES: usize = 5;

/// 播放选项
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    /// 自动推进
    pub auto: bool,
    /// 预设的选项序列
    pub choices: Vec<usize>,
}

/// 停止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 剧情结束
    Ended,
    /// 预设选项已用完
    ChoicesExhausted,
    /// 输入流结束或用户退出
    InputClosed,
    /// 达到帧数上限
    FrameLimit,
}

/// 播放结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaySummary {
    pub frames: u64,
    /// 输出的台词数
    pub lines: usize,
    pub reason: StopReason,
}

/// 用户输入
enum UserAction {
    Input(RuntimeInput),
    Quit,
}

/// 播放器
pub struct Player {
    runtime: DialogueRuntime,
    executor: CommandExecutor,
    config: HostConfig,
    auto: bool,
    choices: VecDeque<usize>,
    /// 最近输出的台词序号
    printed: u64,
    lines: usize,
}

impl Player {
    pub fn new(runtime: DialogueRuntime, config: HostConfig, options: PlayOptions) -> Self {
        Self {
            runtime,
            executor: CommandExecutor::new(),
            config,
            auto: options.auto,
            choices: options.choices.into(),
            printed: 0,
            lines: 0,
        }
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    pub fn runtime(&self) -> &DialogueRuntime {
        &self.runtime
    }

    /// 播放直到结束或停止
    pub fn run(
        &mut self,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> anyhow::Result<PlaySummary> {
        let dt = self.config.frame_dt();
        let mut idle = 0.0_f32;

        let commands = self.runtime.advance();
        self.apply(&commands, out)?;

        for frame in 0..self.config.max_frames {
            let commands = self.runtime.tick(dt);
            self.apply(&commands, out)?;
            self.print_settled_line(out)?;

            let action = match self.runtime.waiting() {
                WaitingReason::Ended => return Ok(self.summary(frame, StopReason::Ended)),
                WaitingReason::WaitForTransition => None,
                WaitingReason::WaitForChoice { choice_count } => {
                    match self.next_choice(choice_count, input, out)? {
                        Some(action) => Some(action),
                        None if self.auto => {
                            info!("预设选项已用完，停止播放");
                            return Ok(self.summary(frame, StopReason::ChoicesExhausted));
                        }
                        None => Some(UserAction::Quit),
                    }
                }
                WaitingReason::WaitForClick => {
                    if self.runtime.state().text.is_transitioning() {
                        idle = 0.0;
                        None
                    } else if self.auto {
                        idle += dt;
                        (idle >= self.config.auto_advance_delay)
                            .then_some(UserAction::Input(RuntimeInput::Advance))
                    } else {
                        Some(self.prompt_click(input, out)?)
                    }
                }
            };

            match action {
                Some(UserAction::Input(runtime_input)) => {
                    idle = 0.0;
                    let commands = self.runtime.handle_input(runtime_input);
                    self.apply(&commands, out)?;
                }
                Some(UserAction::Quit) => {
                    return Ok(self.summary(frame, StopReason::InputClosed));
                }
                None => {}
            }
        }

        let max_frames = self.config.max_frames;
        warn!(max_frames, "达到帧数上限，停止播放");
        Ok(self.summary(max_frames, StopReason::FrameLimit))
    }

    fn apply(&mut self, commands: &[Command], out: &mut impl Write) -> anyhow::Result<()> {
        for line in self.executor.execute_batch(commands) {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    /// 输出显示完成的台词（每句一次）
    fn print_settled_line(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        let state = self.runtime.state();
        if state.text.is_transitioning() || state.line_serial == self.printed {
            return Ok(());
        }
        self.printed = state.line_serial;

        let text = state.text.visible_text();
        if text.is_empty() {
            return Ok(());
        }
        match state.text.speaker() {
            Some(speaker) => writeln!(out, "{}：{}", speaker, text)?,
            None => writeln!(out, "{}", text)?,
        }
        self.lines += 1;
        Ok(())
    }

    fn next_choice(
        &mut self,
        choice_count: usize,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> anyhow::Result<Option<UserAction>> {
        if let Some(index) = self.choices.pop_front() {
            if index >= choice_count {
                anyhow::bail!("预设选项 {} 越界（共 {} 项）", index, choice_count);
            }
            writeln!(out, "> {}", index)?;
            return Ok(Some(UserAction::Input(RuntimeInput::choice(index))));
        }
        if self.auto {
            return Ok(None);
        }

        loop {
            write!(out, "选择 [0-{}]> ", choice_count.saturating_sub(1))?;
            out.flush()?;
            let Some(line) = read_line(input)? else {
                return Ok(Some(UserAction::Quit));
            };
            match line.as_str() {
                "q" => return Ok(Some(UserAction::Quit)),
                "r" => return Ok(Some(UserAction::Input(RuntimeInput::Reset))),
                other => match other.parse::<usize>() {
                    Ok(index) if index < choice_count => {
                        return Ok(Some(UserAction::Input(RuntimeInput::choice(index))));
                    }
                    _ => writeln!(out, "无效的选择: {}", other)?,
                },
            }
        }
    }

    fn prompt_click(
        &mut self,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> anyhow::Result<UserAction> {
        loop {
            write!(out, "▼ ")?;
            out.flush()?;
            let action = match read_line(input)?.as_deref() {
                None | Some("q") => UserAction::Quit,
                Some("r") => UserAction::Input(RuntimeInput::Reset),
                Some("h") => {
                    self.print_backlog(out)?;
                    continue;
                }
                Some(_) => UserAction::Input(RuntimeInput::Advance),
            };
            return Ok(action);
        }
    }

    fn print_backlog(&self, out: &mut impl Write) -> anyhow::Result<()> {
        writeln!(out, "[回看]")?;
        for (speaker, content) in self.runtime.history().recent_lines(BACKLOG_LINES) {
            match speaker {
                Some(speaker) => writeln!(out, "  {}：{}", speaker, content)?,
                None => writeln!(out, "  {}", content)?,
            }
        }
        Ok(())
    }

    fn summary(&self, frames: u64, reason: StopReason) -> PlaySummary {
        PlaySummary {
            frames,
            lines: self.lines,
            reason,
        }
    }
}

/// 读取一行（去除首尾空白），输入结束时返回 None
fn read_line(input: &mut impl BufRead) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("读取输入失败")?;
    Ok((read > 0).then(|| line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use route_runtime::{RuntimeConfig, ScriptLoader};

    const SCRIPT: &str = r#"{
        "routes": [
            { "id": "a", "lines": [ { "speaker": "Ann", "content": "Hi" } ], "next_route": "b" },
            { "id": "b", "question": "Again?", "choices": [
                { "label": "yes", "target": "a" },
                { "label": "no", "target": "end" }
            ] },
            { "id": "end", "lines": [ { "content": "Bye", "effect": "Typewriter" } ] }
        ]
    }"#;

    fn player(options: PlayOptions) -> Player {
        let script = ScriptLoader::new().load_str("test", SCRIPT).unwrap();
        let config = HostConfig {
            fps: 10,
            auto_advance_delay: 0.2,
            runtime: RuntimeConfig {
                typewriter_delay: 0.1,
                ..RuntimeConfig::default()
            },
            ..HostConfig::default()
        };
        let runtime = DialogueRuntime::with_config(script, config.runtime.clone());
        Player::new(runtime, config, options)
    }

    #[test]
    fn test_auto_play_follows_choices() {
        let mut player = player(PlayOptions {
            auto: true,
            choices: vec![0, 1],
        });
        let mut out = Vec::new();
        let summary = player.run(&mut std::io::empty(), &mut out).unwrap();

        assert_eq!(summary.reason, StopReason::Ended);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Ann：Hi").count(), 2);
        assert!(text.contains("Bye"));
        assert!(player.executor().view().ended);
    }

    #[test]
    fn test_auto_play_stops_when_choices_run_out() {
        let mut player = player(PlayOptions {
            auto: true,
            choices: vec![],
        });
        let summary = player.run(&mut std::io::empty(), &mut Vec::new()).unwrap();
        assert_eq!(summary.reason, StopReason::ChoicesExhausted);
        assert_eq!(summary.lines, 1);
    }

    #[test]
    fn test_choice_out_of_range_is_error() {
        let mut player = player(PlayOptions {
            auto: true,
            choices: vec![7],
        });
        assert!(player.run(&mut std::io::empty(), &mut Vec::new()).is_err());
    }

    #[test]
    fn test_interactive_play() {
        let mut player = player(PlayOptions::default());
        // 推进到选项，选 1，推进看完结尾，再推进结束
        let mut input = "\nabc\n1\n\n\n".as_bytes();
        let mut out = Vec::new();
        let summary = player.run(&mut input, &mut out).unwrap();

        assert_eq!(summary.reason, StopReason::Ended);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("无效的选择: abc"));
        assert!(text.contains("Bye"));
    }

    #[test]
    fn test_interactive_backlog() {
        let mut player = player(PlayOptions::default());
        let mut input = "h\nq\n".as_bytes();
        let mut out = Vec::new();
        let summary = player.run(&mut input, &mut out).unwrap();

        assert_eq!(summary.reason, StopReason::InputClosed);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[回看]\n  Ann：Hi\n"));
    }

    #[test]
    fn test_interactive_input_closed() {
        let mut player = player(PlayOptions::default());
        let summary = player.run(&mut std::io::empty(), &mut Vec::new()).unwrap();
        assert_eq!(summary.reason, StopReason::InputClosed);
    }
}
