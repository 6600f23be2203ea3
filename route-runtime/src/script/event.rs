//! # Event 模块
//!
//! 台词事件的两种形态：
//!
//! - [`RawEvent`]：创作数据中的 `指令名 + 字符串参数列表`
//! - [`Event`]：加载期校验后的强类型事件，每个指令一个变体
//!
//! 参数只在加载期解析一次，运行期的分发器不再处理字符串。

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::EventParameterError;
use crate::script::params::ParamReader;

/// 指令标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayBgm,
    PlaySfx,
    ChangeVolumeBgm,
    ChangeVolumeSfx,
    StopBgm,
    StopSfx,
    ChangeBackground,
    AddOrChangeCharacter,
    MoveCharacter,
    ScalingCharacter,
    HideCharacter,
    ShowCharacter,
    RemoveCharacter,
}

impl EventKind {
    /// 创作数据中使用的指令名
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PlayBgm => "PlayBGM",
            Self::PlaySfx => "PlaySFX",
            Self::ChangeVolumeBgm => "ChangeVolumeBGM",
            Self::ChangeVolumeSfx => "ChangeVolumeSFX",
            Self::StopBgm => "StopBGM",
            Self::StopSfx => "StopSFX",
            Self::ChangeBackground => "ChangeBackground",
            Self::AddOrChangeCharacter => "AddOrChangeCharacter",
            Self::MoveCharacter => "MoveCharacter",
            Self::ScalingCharacter => "ScalingCharacter",
            Self::HideCharacter => "HideCharacter",
            Self::ShowCharacter => "ShowCharacter",
            Self::RemoveCharacter => "RemoveCharacter",
        }
    }
}

impl FromStr for EventKind {
    type Err = ();

    /// 从指令名解析（不区分大小写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playbgm" => Ok(Self::PlayBgm),
            "playsfx" => Ok(Self::PlaySfx),
            "changevolumebgm" => Ok(Self::ChangeVolumeBgm),
            "changevolumesfx" => Ok(Self::ChangeVolumeSfx),
            "stopbgm" => Ok(Self::StopBgm),
            "stopsfx" => Ok(Self::StopSfx),
            "changebackground" => Ok(Self::ChangeBackground),
            "addorchangecharacter" => Ok(Self::AddOrChangeCharacter),
            "movecharacter" => Ok(Self::MoveCharacter),
            "scalingcharacter" | "scalecharacter" => Ok(Self::ScalingCharacter),
            "hidecharacter" => Ok(Self::HideCharacter),
            "showcharacter" => Ok(Self::ShowCharacter),
            "removecharacter" => Ok(Self::RemoveCharacter),
            _ => Err(()),
        }
    }
}

/// 创作数据中的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// 指令名，如 `PlayBGM`
    pub command: String,
    /// 按位置解释的字符串参数
    #[serde(default)]
    pub params: Vec<String>,
}

impl RawEvent {
    pub fn new(command: impl Into<String>, params: &[&str]) -> Self {
        Self {
            command: command.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// 角色登场/变更的可选覆盖项
///
/// 为 None 的字段保持角色当前值（新角色则使用默认值）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterChange {
    pub sprite: Option<usize>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub scale_x: Option<f32>,
    pub scale_y: Option<f32>,
}

/// 强类型事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// 播放背景音乐
    ///
    /// 同一曲目已在循环播放时保持不变，除非 `start_over`。
    PlayBgm {
        index: usize,
        volume: f32,
        looping: bool,
        #[serde(default)]
        start_over: bool,
    },
    /// 播放音效
    PlaySfx {
        index: usize,
        volume: f32,
        looping: bool,
    },
    /// 调整 BGM 音量
    ChangeVolumeBgm { volume: f32 },
    /// 调整音效音量
    ChangeVolumeSfx { volume: f32 },
    /// 停止 BGM
    StopBgm,
    /// 停止音效
    StopSfx,
    /// 切换背景，`fade` 为交叉淡化时长（秒）
    ChangeBackground { index: usize, fade: Option<f32> },
    /// 添加或变更角色
    AddOrChangeCharacter {
        name: String,
        change: CharacterChange,
    },
    /// 移动角色，`y` 缺省时保持当前值
    MoveCharacter {
        name: String,
        x: f32,
        y: Option<f32>,
    },
    /// 缩放角色，`scale_y` 缺省时保持当前值
    ScaleCharacter {
        name: String,
        scale_x: f32,
        scale_y: Option<f32>,
    },
    /// 隐藏角色（保留状态）
    HideCharacter { name: String },
    /// 重新显示角色
    ShowCharacter { name: String },
    /// 移除角色
    RemoveCharacter { name: String },
}

/// 循环播放的默认值
pub const DEFAULT_BGM_LOOP: bool = true;
pub const DEFAULT_SFX_LOOP: bool = false;
/// 默认音量
pub const DEFAULT_VOLUME: f32 = 1.0;

impl Event {
    /// 指令标签
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PlayBgm { .. } => EventKind::PlayBgm,
            Self::PlaySfx { .. } => EventKind::PlaySfx,
            Self::ChangeVolumeBgm { .. } => EventKind::ChangeVolumeBgm,
            Self::ChangeVolumeSfx { .. } => EventKind::ChangeVolumeSfx,
            Self::StopBgm => EventKind::StopBgm,
            Self::StopSfx => EventKind::StopSfx,
            Self::ChangeBackground { .. } => EventKind::ChangeBackground,
            Self::AddOrChangeCharacter { .. } => EventKind::AddOrChangeCharacter,
            Self::MoveCharacter { .. } => EventKind::MoveCharacter,
            Self::ScaleCharacter { .. } => EventKind::ScalingCharacter,
            Self::HideCharacter { .. } => EventKind::HideCharacter,
            Self::ShowCharacter { .. } => EventKind::ShowCharacter,
            Self::RemoveCharacter { .. } => EventKind::RemoveCharacter,
        }
    }

    /// 涉及的角色名（非角色事件返回 None）
    pub fn character(&self) -> Option<&str> {
        match self {
            Self::AddOrChangeCharacter { name, .. }
            | Self::MoveCharacter { name, .. }
            | Self::ScaleCharacter { name, .. }
            | Self::HideCharacter { name }
            | Self::ShowCharacter { name }
            | Self::RemoveCharacter { name } => Some(name.as_str()),
            _ => None,
        }
    }

    /// 从创作数据构造强类型事件
    ///
    /// 返回 `(事件, 问题列表)`：
    /// - 必需参数缺失或无效：事件为 None
    /// - 可选参数无效：事件降级为有效前缀对应的低元形式
    /// - 多余参数：忽略
    pub fn from_raw(raw: &RawEvent) -> (Option<Event>, Vec<EventParameterError>) {
        let Ok(kind) = raw.command.parse::<EventKind>() else {
            return (
                None,
                vec![EventParameterError::UnknownCommand {
                    command: raw.command.clone(),
                }],
            );
        };

        let mut r = ParamReader::new(kind.tag(), &raw.params);

        let event = match kind {
            EventKind::PlayBgm => {
                let index = r.required_index("index");
                let volume = r.optional_float("volume").unwrap_or(DEFAULT_VOLUME);
                let looping = r.optional_bool("loop").unwrap_or(DEFAULT_BGM_LOOP);
                let start_over = r.optional_bool("startOver").unwrap_or(false);
                index.map(|index| Event::PlayBgm {
                    index,
                    volume,
                    looping,
                    start_over,
                })
            }
            EventKind::PlaySfx => {
                let index = r.required_index("index");
                let volume = r.optional_float("volume").unwrap_or(DEFAULT_VOLUME);
                let looping = r.optional_bool("loop").unwrap_or(DEFAULT_SFX_LOOP);
                index.map(|index| Event::PlaySfx {
                    index,
                    volume,
                    looping,
                })
            }
            EventKind::ChangeVolumeBgm => {
                let volume = r.required_float("volume");
                volume.map(|volume| Event::ChangeVolumeBgm { volume })
            }
            EventKind::ChangeVolumeSfx => {
                let volume = r.required_float("volume");
                volume.map(|volume| Event::ChangeVolumeSfx { volume })
            }
            EventKind::StopBgm => Some(Event::StopBgm),
            EventKind::StopSfx => Some(Event::StopSfx),
            EventKind::ChangeBackground => {
                let index = r.required_index("index");
                let fade = r.optional_float("fadeDuration");
                index.map(|index| Event::ChangeBackground { index, fade })
            }
            EventKind::AddOrChangeCharacter => {
                let name = r.required_name("name");
                let change = CharacterChange {
                    sprite: r.optional_index("spriteIndex"),
                    x: r.optional_float("x"),
                    y: r.optional_float("y"),
                    scale_x: r.optional_float("scaleX"),
                    scale_y: r.optional_float("scaleY"),
                };
                name.map(|name| Event::AddOrChangeCharacter { name, change })
            }
            EventKind::MoveCharacter => {
                let name = r.required_name("name");
                let x = r.required_float("x");
                let y = r.optional_float("y");
                match (name, x) {
                    (Some(name), Some(x)) => Some(Event::MoveCharacter { name, x, y }),
                    _ => None,
                }
            }
            EventKind::ScalingCharacter => {
                let name = r.required_name("name");
                let scale_x = r.required_float("scaleX");
                let scale_y = r.optional_float("scaleY");
                match (name, scale_x) {
                    (Some(name), Some(scale_x)) => Some(Event::ScaleCharacter {
                        name,
                        scale_x,
                        scale_y,
                    }),
                    _ => None,
                }
            }
            EventKind::HideCharacter => {
                let name = r.required_name("name");
                name.map(|name| Event::HideCharacter { name })
            }
            EventKind::ShowCharacter => {
                let name = r.required_name("name");
                name.map(|name| Event::ShowCharacter { name })
            }
            EventKind::RemoveCharacter => {
                let name = r.required_name("name");
                name.map(|name| Event::RemoveCharacter { name })
            }
        };

        (event, r.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            EventKind::PlayBgm,
            EventKind::ChangeVolumeSfx,
            EventKind::ScalingCharacter,
            EventKind::RemoveCharacter,
        ] {
            assert_eq!(kind.tag().parse::<EventKind>(), Ok(kind));
        }
        assert_eq!("playbgm".parse::<EventKind>(), Ok(EventKind::PlayBgm));
        assert!("Dance".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_play_bgm_full_and_defaults() {
        let (event, problems) =
            Event::from_raw(&RawEvent::new("PlayBGM", &["0", "0.5", "false", "true"]));
        assert!(problems.is_empty());
        assert_eq!(
            event,
            Some(Event::PlayBgm {
                index: 0,
                volume: 0.5,
                looping: false,
                start_over: true,
            })
        );

        let (event, problems) = Event::from_raw(&RawEvent::new("PlaySFX", &[" 2 "]));
        assert!(problems.is_empty());
        assert_eq!(
            event,
            Some(Event::PlaySfx {
                index: 2,
                volume: DEFAULT_VOLUME,
                looping: DEFAULT_SFX_LOOP
            })
        );
    }

    #[test]
    fn test_play_bgm_degrades_on_invalid_loop() {
        let (event, problems) = Event::from_raw(&RawEvent::new("PlayBGM", &["0", "0.5", "maybe"]));
        assert_eq!(problems.len(), 1);
        assert_eq!(
            event,
            Some(Event::PlayBgm {
                index: 0,
                volume: 0.5,
                looping: DEFAULT_BGM_LOOP,
                start_over: false,
            })
        );
    }

    #[test]
    fn test_play_bgm_invalid_start_over() {
        let (event, problems) =
            Event::from_raw(&RawEvent::new("PlayBGM", &["0", "1", "true", "again"]));
        assert_eq!(problems.len(), 1);
        assert!(matches!(
            event,
            Some(Event::PlayBgm {
                start_over: false,
                ..
            })
        ));
    }

    #[test]
    fn test_play_bgm_degrades_on_invalid_volume() {
        // 音量无效时后续的 loop 参数也被丢弃
        let (event, problems) = Event::from_raw(&RawEvent::new("PlayBGM", &["1", "loud", "false"]));
        assert_eq!(problems.len(), 1);
        assert_eq!(
            event,
            Some(Event::PlayBgm {
                index: 1,
                volume: DEFAULT_VOLUME,
                looping: DEFAULT_BGM_LOOP,
                start_over: false,
            })
        );
    }

    #[test]
    fn test_change_background_invalid_index_is_dropped() {
        let (event, problems) = Event::from_raw(&RawEvent::new("ChangeBackground", &["notanint"]));
        assert_eq!(event, None);
        let EventParameterError::InvalidParameter { param, value, .. } = &problems[0] else {
            panic!("期望 InvalidParameter: {problems:?}");
        };
        assert_eq!((*param, value.as_str()), ("index", "notanint"));
    }

    #[test]
    fn test_add_character_partial_overrides() {
        let (event, problems) = Event::from_raw(&RawEvent::new(
            "AddOrChangeCharacter",
            &["Alice", "1", "-120.5", "oops", "2"],
        ));
        assert_eq!(problems.len(), 1);
        assert_eq!(
            event,
            Some(Event::AddOrChangeCharacter {
                name: "Alice".to_string(),
                change: CharacterChange {
                    sprite: Some(1),
                    x: Some(-120.5),
                    ..Default::default()
                },
            })
        );
    }

    #[test]
    fn test_move_requires_x() {
        let (event, problems) = Event::from_raw(&RawEvent::new("MoveCharacter", &["Alice"]));
        assert_eq!(event, None);
        assert!(matches!(
            &problems[0],
            EventParameterError::MissingParameter { param: "x", .. }
        ));
    }

    #[test]
    fn test_unknown_command() {
        let (event, problems) = Event::from_raw(&RawEvent::new("Explode", &[]));
        assert_eq!(event, None);
        assert_eq!(
            problems,
            vec![EventParameterError::UnknownCommand {
                command: "Explode".to_string()
            }]
        );
    }

    #[test]
    fn test_stop_with_extra_params_still_loads() {
        let (event, problems) = Event::from_raw(&RawEvent::new("StopSFX", &["now"]));
        assert_eq!(event, Some(Event::StopSfx));
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_character_name_accessor() {
        let event = Event::HideCharacter {
            name: "Bob".to_string(),
        };
        assert_eq!(event.character(), Some("Bob"));
        assert_eq!(event.kind(), EventKind::HideCharacter);
        assert_eq!(Event::StopBgm.character(), None);
    }
}
