//! # Engine 模块
//!
//! Route 导航器：推进台词、处理选择、切换 Route。
//!
//! ## 推进规则
//!
//! ```text
//! advance()
//!   背景过渡中        -> 忽略
//!   文本过渡中        -> 立即完成过渡，不做其他事
//!   还有台词          -> 停止上一句的音效，显示台词，再按顺序执行事件
//!   选择中 / 已结束    -> 无操作
//!   Route 有选项      -> 进入选择状态
//!   Route 有 next     -> 切换 Route
//!   否则              -> 剧情结束（只通知一次）
//! ```
//!
//! 切换到没有台词的 Route 时立即处理它的结尾（选项 / next / 结束），
//! 空 Route 之间的循环会被检测并结束播放。

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::{RuntimeConfig, sanitize_duration};
use crate::error::RuntimeError;
use crate::history::{History, HistoryEvent};
use crate::input::RuntimeInput;
use crate::runtime::dispatcher::EventDispatcher;
use crate::script::{DialogueLine, Route, Script};
use crate::stage::CharacterStage;
use crate::state::{PlaybackMode, PlaybackState, RoutePosition, WaitingReason};

/// 对话运行时
///
/// 这是 route-runtime 的核心类型。Host 把输入交给它，并每帧调用 `tick(dt)`，
/// 然后执行返回的 [`Command`]。
///
/// # 使用示例
///
/// ```ignore
/// let script = ScriptLoader::new().load_str("demo", &text)?;
/// let mut runtime = DialogueRuntime::new(script);
///
/// loop {
///     let mut commands = runtime.tick(dt);
///     if let Some(input) = poll_input() {
///         commands.extend(runtime.handle_input(input));
///     }
///     // Host 执行 commands...
/// }
/// ```
pub struct DialogueRuntime {
    script: Script,
    config: RuntimeConfig,
    state: PlaybackState,
    stage: CharacterStage,
    dispatcher: EventDispatcher,
    history: History,
}

impl DialogueRuntime {
    /// 使用默认配置创建
    pub fn new(script: Script) -> Self {
        Self::with_config(script, RuntimeConfig::default())
    }

    /// 创建新的 Runtime 实例
    ///
    /// 创建后停在起始 Route 的第一句之前，第一次 `advance` 才会显示内容。
    pub fn with_config(script: Script, config: RuntimeConfig) -> Self {
        let config = config.sanitized();
        Self {
            state: PlaybackState::new(script.start_route.clone()),
            stage: CharacterStage::new(config.character_fade),
            dispatcher: EventDispatcher::new(script.assets.clone()),
            history: History::with_capacity(config.history_capacity),
            config,
            script,
        }
    }

    /// 推进
    pub fn advance(&mut self) -> Vec<Command> {
        if self.state.background.is_transitioning() {
            debug!("背景过渡中，忽略推进");
            return Vec::new();
        }

        if self.state.text.is_transitioning() {
            return self.state.text.complete_active_transition();
        }

        if self.state.mode != PlaybackMode::Reading {
            return Vec::new();
        }

        let index = self.state.position.line_index;
        let has_line = self
            .current_route()
            .is_some_and(|route| index < route.lines.len());

        let mut commands = Vec::new();
        if has_line {
            self.show_line(index, &mut commands);
        } else {
            self.settle_route_end(&mut commands);
        }
        commands
    }

    /// 选择选项
    ///
    /// 成功后切换到目标 Route，等待下一次推进。
    /// 不在选择状态或索引越界时状态保持不变。
    pub fn select_choice(&mut self, index: usize) -> Result<Vec<Command>, RuntimeError> {
        let result = self.try_select(index);
        if let Err(e) = &result {
            warn!(index, error = %e, "选择无效");
        }
        result
    }

    /// 回到起始 Route
    ///
    /// 清空文本、背景过渡、舞台角色与历史记录。
    pub fn reset_to_start(&mut self) -> Vec<Command> {
        info!(route = %self.script.start_route, "重新开始");

        let mut commands = self.state.text.reset();
        self.state.background.clear();
        commands.extend(self.stage.clear());
        self.history.clear();

        let start = self.script.start_route.clone();
        self.enter_route(&start, &mut commands);
        commands
    }

    /// 推进所有计时过渡
    ///
    /// 顺序：文本、背景、角色。负数或非有限的 `dt` 按 0 处理。
    pub fn tick(&mut self, dt: f32) -> Vec<Command> {
        let dt = sanitize_duration(dt);

        let mut commands = self.state.text.tick(dt);
        if self.state.background.tick(dt) {
            debug!("背景过渡结束");
        }
        commands.extend(self.stage.tick(dt));
        commands
    }

    /// 处理 Host 输入
    ///
    /// 错误只记录日志，返回空列表。
    pub fn handle_input(&mut self, input: RuntimeInput) -> Vec<Command> {
        match input {
            RuntimeInput::Advance => self.advance(),
            RuntimeInput::SelectChoice { index } => self.select_choice(index).unwrap_or_default(),
            RuntimeInput::Reset => self.reset_to_start(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn waiting(&self) -> WaitingReason {
        self.state.waiting()
    }

    pub fn stage(&self) -> &CharacterStage {
        &self.stage
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn is_ended(&self) -> bool {
        self.state.is_ended()
    }

    /// 当前 Route
    pub fn current_route(&self) -> Option<&Route> {
        self.script.route(&self.state.position.route)
    }

    /// 最近显示的台词
    pub fn current_line(&self) -> Option<&DialogueLine> {
        let index = self.state.position.line_index.checked_sub(1)?;
        self.current_route()?.lines.get(index)
    }

    fn show_line(&mut self, index: usize, commands: &mut Vec<Command>) {
        let Some(line) = self
            .script
            .route(&self.state.position.route)
            .and_then(|route| route.lines.get(index))
        else {
            return;
        };

        if self.state.audio.take_sfx() {
            commands.push(Command::StopSfx);
        }

        // 先显示文本，再执行事件
        commands.extend(self.state.text.display(line, self.config.typewriter_delay));
        self.history.push(HistoryEvent::dialogue(
            line.speaker.clone(),
            self.state.text.committed_text().to_string(),
        ));
        commands.extend(self.dispatcher.execute(
            &line.events,
            &mut self.stage,
            &mut self.state.background,
            &mut self.state.audio,
        ));

        self.state.position.line_index = index + 1;
        self.state.line_serial += 1;
    }

    fn try_select(&mut self, index: usize) -> Result<Vec<Command>, RuntimeError> {
        if !self.state.is_choosing() {
            return Err(RuntimeError::NotInChoiceMode);
        }

        let route = self
            .current_route()
            .ok_or_else(|| RuntimeError::RouteNotFound {
                route: self.state.position.route.clone(),
            })?;
        let choice = route
            .choices
            .get(index)
            .ok_or(RuntimeError::InvalidChoiceIndex {
                index,
                max: route.choices.len(),
            })?;
        let target = choice.target.clone();
        let options = route.choices.iter().map(|c| c.label.clone()).collect();

        info!(index, target = %target, "选择选项");
        self.history.push(HistoryEvent::choice_made(options, index));

        let mut commands = Vec::new();
        self.enter_route(&target, &mut commands);
        if self.current_route().is_some_and(Route::is_empty) {
            self.settle_route_end(&mut commands);
        }
        Ok(commands)
    }

    /// 处理当前 Route 的结尾
    fn settle_route_end(&mut self, commands: &mut Vec<Command>) {
        let mut visited = HashSet::new();

        loop {
            let Some(route) = self.script.route(&self.state.position.route) else {
                warn!(route = %self.state.position.route, "Route 未找到，播放结束");
                self.finish(commands);
                return;
            };

            if route.has_choices() {
                self.state.mode = PlaybackMode::Choosing {
                    choice_count: route.choices.len(),
                };
                commands.push(Command::PresentChoices {
                    question: route.question.clone(),
                    choices: route.choices.clone(),
                });
                return;
            }

            let Some(next) = route.next_route.clone() else {
                self.finish(commands);
                return;
            };

            self.enter_route(&next, commands);
            if !self.current_route().is_some_and(Route::is_empty) {
                return;
            }
            if !visited.insert(next) {
                warn!(route = %self.state.position.route, "空 Route 构成循环，播放结束");
                self.finish(commands);
                return;
            }
        }
    }

    fn enter_route(&mut self, route: &str, commands: &mut Vec<Command>) {
        if self.state.is_choosing() {
            commands.push(Command::ClearChoices);
        }
        self.state.mode = PlaybackMode::Reading;
        self.state.position = RoutePosition::new(route);

        info!(route = %route, "进入 Route");
        commands.push(Command::EnterRoute {
            route: route.to_string(),
        });
        self.history
            .push(HistoryEvent::route_change(route.to_string()));
    }

    fn finish(&mut self, commands: &mut Vec<Command>) {
        if self.state.is_ended() {
            return;
        }
        self.state.mode = PlaybackMode::Ended;

        info!(route = %self.state.position.route, "剧情结束");
        commands.push(Command::RouteEnded {
            route: self.state.position.route.clone(),
        });
    }
}
