//! # Dispatcher 模块
//!
//! 按创作顺序执行台词上的事件。
//!
//! ## 职责
//!
//! - 通过资源目录把索引解析为资源引用
//! - 音频与背景事件转换为 Command
//! - 角色事件交给 [`CharacterStage`]
//!
//! 单个事件失败（索引越界、角色未登场）只记录警告并跳过，不影响同一句上的其他事件。

use tracing::{debug, warn};

use crate::command::Command;
use crate::config::is_instant;
use crate::error::RuntimeError;
use crate::presentation::FadeClock;
use crate::script::{AssetCatalog, AssetKind, Event};
use crate::stage::CharacterStage;
use crate::state::{AudioState, BackgroundState};

/// 事件分发器
///
/// 只持有资源目录，不持有任何设备状态。
#[derive(Debug, Clone, Default)]
pub struct EventDispatcher {
    assets: AssetCatalog,
}

impl EventDispatcher {
    pub fn new(assets: AssetCatalog) -> Self {
        Self { assets }
    }

    /// 依次执行事件，跳过失败的事件
    pub fn execute(
        &self,
        events: &[Event],
        stage: &mut CharacterStage,
        background: &mut BackgroundState,
        audio: &mut AudioState,
    ) -> Vec<Command> {
        let mut commands = Vec::new();
        for event in events {
            match self.dispatch(event, stage, background, audio) {
                Ok(produced) => commands.extend(produced),
                Err(e) => warn!(event = event.kind().tag(), error = %e, "事件执行失败，已跳过"),
            }
        }
        commands
    }

    /// 执行单个事件
    pub fn dispatch(
        &self,
        event: &Event,
        stage: &mut CharacterStage,
        background: &mut BackgroundState,
        audio: &mut AudioState,
    ) -> Result<Vec<Command>, RuntimeError> {
        debug!(event = event.kind().tag(), "执行事件");

        let commands = match event {
            Event::PlayBgm {
                index,
                volume,
                looping,
                start_over,
            } => {
                let path = self.resolve(AssetKind::Bgm, *index)?;
                if !audio.should_play_bgm(&path, *start_over) {
                    debug!(path = %path, "BGM 已在播放，保持不变");
                    return Ok(Vec::new());
                }
                audio.bgm = looping.then(|| path.clone());
                vec![Command::PlayBgm {
                    path,
                    volume: clamp_volume(*volume),
                    looping: *looping,
                }]
            }
            Event::PlaySfx {
                index,
                volume,
                looping,
            } => {
                let path = self.resolve(AssetKind::Sfx, *index)?;
                audio.sfx_active = true;
                vec![Command::PlaySfx {
                    path,
                    volume: clamp_volume(*volume),
                    looping: *looping,
                }]
            }
            Event::ChangeVolumeBgm { volume } => vec![Command::SetBgmVolume {
                volume: clamp_volume(*volume),
            }],
            Event::ChangeVolumeSfx { volume } => vec![Command::SetSfxVolume {
                volume: clamp_volume(*volume),
            }],
            Event::StopBgm => {
                audio.bgm = None;
                vec![Command::StopBgm]
            }
            Event::StopSfx => {
                audio.sfx_active = false;
                vec![Command::StopSfx]
            }
            Event::ChangeBackground { index, fade } => {
                let path = self.resolve(AssetKind::Background, *index)?;
                background.current = Some(path.clone());
                match fade.filter(|d| !is_instant(*d)) {
                    Some(duration) => {
                        background.fade = Some(FadeClock::new(duration));
                        vec![Command::CrossFadeBackground { path, duration }]
                    }
                    None => {
                        background.fade = None;
                        vec![Command::SetBackground { path }]
                    }
                }
            }
            Event::AddOrChangeCharacter { name, change } => {
                let sprite = change
                    .sprite
                    .map(|i| self.resolve(AssetKind::Sprite, i))
                    .transpose()?;
                stage.upsert(name, sprite, change)
            }
            Event::MoveCharacter { name, x, y } => stage.move_to(name, *x, *y)?,
            Event::ScaleCharacter {
                name,
                scale_x,
                scale_y,
            } => stage.scale_to(name, *scale_x, *scale_y)?,
            Event::HideCharacter { name } => stage.hide(name)?,
            Event::ShowCharacter { name } => stage.show(name)?,
            Event::RemoveCharacter { name } => stage.remove(name)?,
        };

        Ok(commands)
    }

    fn resolve(&self, kind: AssetKind, index: usize) -> Result<String, RuntimeError> {
        self.assets.resolve(kind, index).map(str::to_string)
    }
}

fn clamp_volume(volume: f32) -> f32 {
    let clamped = volume.clamp(0.0, 1.0);
    if clamped != volume {
        debug!(volume, clamped, "音量超出范围，已截断");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::CharacterChange;

    fn dispatcher() -> EventDispatcher {
        EventDispatcher::new(AssetCatalog {
            bgm: vec!["bgm/theme.ogg".to_string(), "bgm/night.ogg".to_string()],
            sfx: vec!["sfx/door.wav".to_string()],
            backgrounds: vec!["bg/room.png".to_string()],
            sprites: vec!["ann/normal.png".to_string()],
        })
    }

    #[derive(Default)]
    struct Scene {
        stage: CharacterStage,
        background: BackgroundState,
        audio: AudioState,
    }

    impl Scene {
        fn run(&mut self, d: &EventDispatcher, events: &[Event]) -> Vec<Command> {
            d.execute(
                events,
                &mut self.stage,
                &mut self.background,
                &mut self.audio,
            )
        }
    }

    fn play_bgm(index: usize, start_over: bool) -> Event {
        Event::PlayBgm {
            index,
            volume: 1.0,
            looping: true,
            start_over,
        }
    }

    #[test]
    fn test_audio_events() {
        let d = dispatcher();
        let mut scene = Scene::default();

        let commands = scene.run(
            &d,
            &[
                Event::PlayBgm {
                    index: 0,
                    volume: 1.5,
                    looping: true,
                    start_over: false,
                },
                Event::PlaySfx {
                    index: 0,
                    volume: 0.5,
                    looping: false,
                },
                Event::ChangeVolumeSfx { volume: -1.0 },
                Event::StopBgm,
            ],
        );

        assert_eq!(
            commands,
            vec![
                Command::PlayBgm {
                    path: "bgm/theme.ogg".to_string(),
                    volume: 1.0,
                    looping: true,
                },
                Command::PlaySfx {
                    path: "sfx/door.wav".to_string(),
                    volume: 0.5,
                    looping: false,
                },
                Command::SetSfxVolume { volume: 0.0 },
                Command::StopBgm,
            ]
        );
        assert_eq!(scene.audio.bgm, None);
        assert!(scene.audio.sfx_active);
    }

    #[test]
    fn test_same_bgm_keeps_playing() {
        let d = dispatcher();
        let mut scene = Scene::default();

        assert_eq!(scene.run(&d, &[play_bgm(0, false)]).len(), 1);
        assert!(scene.run(&d, &[play_bgm(0, false)]).is_empty());
        assert_eq!(scene.audio.bgm.as_deref(), Some("bgm/theme.ogg"));

        // 从头播放或换曲都会重新发出指令
        assert_eq!(scene.run(&d, &[play_bgm(0, true)]).len(), 1);
        assert_eq!(
            scene.run(&d, &[play_bgm(1, false)]),
            vec![Command::PlayBgm {
                path: "bgm/night.ogg".to_string(),
                volume: 1.0,
                looping: true,
            }]
        );

        scene.run(&d, &[Event::StopBgm]);
        assert_eq!(scene.run(&d, &[play_bgm(1, false)]).len(), 1);
    }

    #[test]
    fn test_non_looping_bgm_is_not_tracked() {
        let d = dispatcher();
        let mut scene = Scene::default();
        let once = Event::PlayBgm {
            index: 0,
            volume: 1.0,
            looping: false,
            start_over: false,
        };

        assert_eq!(scene.run(&d, &[once.clone()]).len(), 1);
        assert_eq!(scene.audio.bgm, None);
        assert_eq!(scene.run(&d, &[once]).len(), 1);
    }

    #[test]
    fn test_out_of_range_index_is_skipped() {
        let d = dispatcher();
        let mut scene = Scene::default();

        let commands = scene.run(
            &d,
            &[
                Event::ChangeBackground {
                    index: 7,
                    fade: None,
                },
                Event::StopSfx,
            ],
        );

        assert_eq!(commands, vec![Command::StopSfx]);
        assert!(scene.background.current.is_none());
    }

    #[test]
    fn test_background_cross_fade_opens_gate() {
        let d = dispatcher();
        let mut scene = Scene::default();

        let commands = scene.run(
            &d,
            &[Event::ChangeBackground {
                index: 0,
                fade: Some(1.0),
            }],
        );

        assert_eq!(
            commands,
            vec![Command::CrossFadeBackground {
                path: "bg/room.png".to_string(),
                duration: 1.0,
            }]
        );
        assert!(scene.background.is_transitioning());
    }

    #[test]
    fn test_instant_background() {
        let d = dispatcher();
        let mut scene = Scene::default();

        let commands = scene.run(
            &d,
            &[Event::ChangeBackground {
                index: 0,
                fade: Some(0.0),
            }],
        );

        assert_eq!(
            commands,
            vec![Command::SetBackground {
                path: "bg/room.png".to_string()
            }]
        );
        assert!(!scene.background.is_transitioning());
        assert_eq!(scene.background.current.as_deref(), Some("bg/room.png"));
    }

    #[test]
    fn test_character_events() {
        let d = dispatcher();
        let mut scene = Scene::default();

        scene.run(
            &d,
            &[
                Event::AddOrChangeCharacter {
                    name: "Ann".to_string(),
                    change: CharacterChange {
                        sprite: Some(0),
                        ..CharacterChange::default()
                    },
                },
                Event::MoveCharacter {
                    name: "Ann".to_string(),
                    x: 2.0,
                    y: None,
                },
                // 未登场的角色被跳过
                Event::HideCharacter {
                    name: "Bob".to_string(),
                },
            ],
        );

        let ann = scene.stage.get("Ann").unwrap();
        assert_eq!(ann.sprite.as_deref(), Some("ann/normal.png"));
        assert_eq!(ann.position.x, 2.0);
        assert_eq!(scene.stage.len(), 1);
    }

    #[test]
    fn test_bad_sprite_index_skips_event() {
        let d = dispatcher();
        let mut scene = Scene::default();

        let result = d.dispatch(
            &Event::AddOrChangeCharacter {
                name: "Ann".to_string(),
                change: CharacterChange {
                    sprite: Some(3),
                    ..CharacterChange::default()
                },
            },
            &mut scene.stage,
            &mut scene.background,
            &mut scene.audio,
        );

        assert!(matches!(
            result,
            Err(RuntimeError::AssetIndexOutOfRange {
                kind: AssetKind::Sprite,
                index: 3,
                len: 1
            })
        ));
        assert!(scene.stage.is_empty());
    }
}
