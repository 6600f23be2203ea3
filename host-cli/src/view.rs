//! # View 模块
//!
//! 无头 Host 的“画面”：把 Runtime 发出的 Command 应用到一份镜像状态上。
//!
//! ## 设计说明
//!
//! - [`CommandExecutor`] 只更新 [`HostView`]，不做任何真实渲染或播放
//! - 值得告知用户的 Command 会被描述成一行文字，交给播放器输出

use std::collections::BTreeMap;

use route_runtime::{Choice, Command, Vec2};
use tracing::debug;

/// 音频通道
#[derive(Debug, Clone, PartialEq)]
pub struct AudioView {
    pub path: String,
    pub looping: bool,
}

/// 角色
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterView {
    pub sprite: Option<String>,
    pub position: Vec2,
    pub scale: Vec2,
    pub visible: bool,
    pub alpha: f32,
}

impl Default for CharacterView {
    fn default() -> Self {
        Self {
            sprite: None,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            visible: true,
            alpha: 1.0,
        }
    }
}

/// 镜像状态
#[derive(Debug, Clone, PartialEq)]
pub struct HostView {
    pub route: Option<String>,
    pub speaker: Option<String>,
    pub text: String,
    pub text_alpha: f32,
    pub background: Option<String>,
    pub bgm: Option<AudioView>,
    pub bgm_volume: f32,
    pub sfx: Option<AudioView>,
    pub sfx_volume: f32,
    pub question: Option<String>,
    pub choices: Vec<Choice>,
    pub characters: BTreeMap<String, CharacterView>,
    pub ended: bool,
}

impl Default for HostView {
    fn default() -> Self {
        Self {
            route: None,
            speaker: None,
            text: String::new(),
            text_alpha: 1.0,
            background: None,
            bgm: None,
            bgm_volume: 1.0,
            sfx: None,
            sfx_volume: 1.0,
            question: None,
            choices: Vec::new(),
            characters: BTreeMap::new(),
            ended: false,
        }
    }
}

/// Command 执行器
#[derive(Debug, Default)]
pub struct CommandExecutor {
    view: HostView,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &HostView {
        &self.view
    }

    /// 执行单个 Command
    ///
    /// 返回需要告知用户的描述（如果有）。
    pub fn execute(&mut self, command: &Command) -> Option<String> {
        debug!(?command, "执行指令");
        let view = &mut self.view;

        match command {
            Command::SetSpeaker { speaker } => view.speaker = speaker.clone(),
            Command::SetText { content } => view.text = content.clone(),
            Command::SetTextOpacity { alpha } => view.text_alpha = *alpha,
            Command::PresentChoices { question, choices } => {
                view.question = question.clone();
                view.choices = choices.clone();
                return Some(describe_choices(question.as_deref(), choices));
            }
            Command::ClearChoices => {
                view.question = None;
                view.choices.clear();
            }
            Command::EnterRoute { route } => {
                view.route = Some(route.clone());
                view.ended = false;
                return Some(format!("── {} ──", route));
            }
            Command::RouteEnded { route } => {
                view.ended = true;
                return Some(format!("── 剧情结束（{}） ──", route));
            }
            Command::SetBackground { path } => {
                view.background = Some(path.clone());
                return Some(format!("[背景] {}", path));
            }
            Command::CrossFadeBackground { path, duration } => {
                view.background = Some(path.clone());
                return Some(format!("[背景] {}（淡入 {}s）", path, duration));
            }
            Command::PlayBgm {
                path,
                volume,
                looping,
            } => {
                view.bgm = Some(AudioView {
                    path: path.clone(),
                    looping: *looping,
                });
                view.bgm_volume = *volume;
                return Some(format!("[BGM] {}", path));
            }
            Command::SetBgmVolume { volume } => view.bgm_volume = *volume,
            Command::StopBgm => view.bgm = None,
            Command::PlaySfx {
                path,
                volume,
                looping,
            } => {
                view.sfx = Some(AudioView {
                    path: path.clone(),
                    looping: *looping,
                });
                view.sfx_volume = *volume;
                return Some(format!("[SFX] {}", path));
            }
            Command::SetSfxVolume { volume } => view.sfx_volume = *volume,
            Command::StopSfx => view.sfx = None,
            Command::SetCharacterSprite { name, path } => {
                view.characters.entry(name.clone()).or_default().sprite = Some(path.clone());
            }
            Command::SetCharacterTransform {
                name,
                position,
                scale,
            } => {
                let character = view.characters.entry(name.clone()).or_default();
                character.position = *position;
                character.scale = *scale;
            }
            Command::SetCharacterVisible { name, visible } => {
                view.characters.entry(name.clone()).or_default().visible = *visible;
            }
            Command::SetCharacterAlpha { name, alpha } => {
                view.characters.entry(name.clone()).or_default().alpha = *alpha;
            }
            Command::RemoveCharacter { name } => {
                view.characters.remove(name);
            }
        }

        None
    }

    /// 批量执行
    pub fn execute_batch(&mut self, commands: &[Command]) -> Vec<String> {
        commands.iter().filter_map(|c| self.execute(c)).collect()
    }
}

fn describe_choices(question: Option<&str>, choices: &[Choice]) -> String {
    let mut text = question.unwrap_or("请选择").to_string();
    for (i, choice) in choices.iter().enumerate() {
        text.push_str(&format!("\n  {}) {}", i, choice.label));
    }
    text
}
