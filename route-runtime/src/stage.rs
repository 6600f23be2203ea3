//! # Stage 模块
//!
//! 角色舞台：按名字管理登场角色的位置、缩放、立绘与可见性。
//!
//! ## 立绘切换
//!
//! 配置了淡入淡出时长时，已在场且可见的角色按以下顺序切换：
//!
//! ```text
//! 淡出旧立绘 → 应用立绘/位置/缩放 → 淡入
//! ```
//!
//! 新登场的角色先应用再淡入。同一角色的新变更会先立即完成上一次变更。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::command::{Command, Vec2};
use crate::config::is_instant;
use crate::error::RuntimeError;
use crate::presentation::FadeClock;
use crate::script::CharacterChange;

/// 舞台上的角色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub position: Vec2,
    pub scale: Vec2,
    /// 立绘引用
    pub sprite: Option<String>,
    pub visible: bool,
    pub alpha: f32,
}

impl Character {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            sprite: None,
            visible: true,
            alpha: 1.0,
        }
    }
}

/// 角色变更的目标外观
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Appearance {
    sprite: Option<String>,
    position: Vec2,
    scale: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ChangePhase {
    /// 淡出中，结束后应用目标外观
    FadingOut {
        clock: FadeClock,
        target: Appearance,
    },
    FadingIn { clock: FadeClock },
}

/// 角色舞台
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterStage {
    characters: BTreeMap<String, Character>,
    changes: BTreeMap<String, ChangePhase>,
    /// 立绘切换的淡入淡出时长（秒）
    fade: f32,
}

impl CharacterStage {
    pub fn new(fade: f32) -> Self {
        Self {
            fade,
            ..Self::default()
        }
    }

    /// 登场或变更角色
    ///
    /// `sprite` 是已解析的立绘引用；`change` 中未指定的字段保持原值。
    pub fn upsert(
        &mut self,
        name: &str,
        sprite: Option<String>,
        change: &CharacterChange,
    ) -> Vec<Command> {
        let mut out = Vec::new();
        self.finish_change(name, &mut out);

        let animated = !is_instant(self.fade);
        match self.characters.get(name) {
            None => {
                let mut character = Character::new(name);
                let target = apply_change(&character, sprite, change);
                character.alpha = if animated { 0.0 } else { 1.0 };
                self.characters.insert(name.to_string(), character);

                self.apply_appearance(name, target, &mut out);
                out.push(Command::SetCharacterVisible {
                    name: name.to_string(),
                    visible: true,
                });
                out.push(Command::SetCharacterAlpha {
                    name: name.to_string(),
                    alpha: if animated { 0.0 } else { 1.0 },
                });
                if animated {
                    self.changes.insert(
                        name.to_string(),
                        ChangePhase::FadingIn {
                            clock: FadeClock::new(self.fade),
                        },
                    );
                }
            }
            Some(existing) => {
                let target = apply_change(existing, sprite, change);
                if animated && existing.visible && existing.alpha > 0.0 {
                    self.changes.insert(
                        name.to_string(),
                        ChangePhase::FadingOut {
                            clock: FadeClock::new(self.fade),
                            target,
                        },
                    );
                } else {
                    self.apply_appearance(name, target, &mut out);
                }
            }
        }

        out
    }

    /// 移动角色，未指定的 y 保持原值
    pub fn move_to(
        &mut self,
        name: &str,
        x: f32,
        y: Option<f32>,
    ) -> Result<Vec<Command>, RuntimeError> {
        self.transform(name, |c| {
            c.position = Vec2::new(x, y.unwrap_or(c.position.y));
        })
    }

    /// 缩放角色，未指定的纵向缩放保持原值
    pub fn scale_to(
        &mut self,
        name: &str,
        scale_x: f32,
        scale_y: Option<f32>,
    ) -> Result<Vec<Command>, RuntimeError> {
        self.transform(name, |c| {
            c.scale = Vec2::new(scale_x, scale_y.unwrap_or(c.scale.y));
        })
    }

    pub fn hide(&mut self, name: &str) -> Result<Vec<Command>, RuntimeError> {
        self.set_visible(name, false)
    }

    pub fn show(&mut self, name: &str) -> Result<Vec<Command>, RuntimeError> {
        self.set_visible(name, true)
    }

    /// 移除角色及其未完成的变更
    pub fn remove(&mut self, name: &str) -> Result<Vec<Command>, RuntimeError> {
        self.characters.remove(name).ok_or_else(|| unknown(name))?;
        self.changes.remove(name);
        Ok(vec![Command::RemoveCharacter {
            name: name.to_string(),
        }])
    }

    /// 移除所有角色
    pub fn clear(&mut self) -> Vec<Command> {
        self.changes.clear();
        std::mem::take(&mut self.characters)
            .into_keys()
            .map(|name| Command::RemoveCharacter { name })
            .collect()
    }

    /// 推进所有立绘切换
    pub fn tick(&mut self, dt: f32) -> Vec<Command> {
        let mut out = Vec::new();

        for (name, phase) in std::mem::take(&mut self.changes) {
            match phase {
                ChangePhase::FadingOut { mut clock, target } => {
                    let progress = clock.advance(dt);
                    if clock.is_finished() {
                        self.set_alpha(&name, 0.0, &mut out);
                        self.apply_appearance(&name, target, &mut out);
                        self.changes.insert(
                            name,
                            ChangePhase::FadingIn {
                                clock: FadeClock::new(self.fade),
                            },
                        );
                    } else {
                        self.set_alpha(&name, 1.0 - progress, &mut out);
                        self.changes
                            .insert(name, ChangePhase::FadingOut { clock, target });
                    }
                }
                ChangePhase::FadingIn { mut clock } => {
                    let progress = clock.advance(dt);
                    self.set_alpha(&name, progress, &mut out);
                    if !clock.is_finished() {
                        self.changes.insert(name, ChangePhase::FadingIn { clock });
                    }
                }
            }
        }

        out
    }

    pub fn get(&self, name: &str) -> Option<&Character> {
        self.characters.get(name)
    }

    /// 按名字排序遍历角色
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// 是否有进行中的立绘切换
    pub fn is_animating(&self) -> bool {
        !self.changes.is_empty()
    }

    fn transform(
        &mut self,
        name: &str,
        update: impl FnOnce(&mut Character),
    ) -> Result<Vec<Command>, RuntimeError> {
        if !self.characters.contains_key(name) {
            return Err(unknown(name));
        }
        let mut out = Vec::new();
        self.finish_change(name, &mut out);

        let character = self.characters.get_mut(name).ok_or_else(|| unknown(name))?;
        update(character);
        out.push(transform_command(character));
        Ok(out)
    }

    fn set_visible(&mut self, name: &str, visible: bool) -> Result<Vec<Command>, RuntimeError> {
        if !self.characters.contains_key(name) {
            return Err(unknown(name));
        }
        let mut out = Vec::new();
        self.finish_change(name, &mut out);

        let character = self.characters.get_mut(name).ok_or_else(|| unknown(name))?;
        character.visible = visible;
        out.push(Command::SetCharacterVisible {
            name: name.to_string(),
            visible,
        });
        Ok(out)
    }

    /// 立即完成某个角色的变更
    fn finish_change(&mut self, name: &str, out: &mut Vec<Command>) {
        let Some(phase) = self.changes.remove(name) else {
            return;
        };
        if let ChangePhase::FadingOut { target, .. } = phase {
            self.apply_appearance(name, target, out);
        }
        self.set_alpha(name, 1.0, out);
    }

    fn apply_appearance(&mut self, name: &str, target: Appearance, out: &mut Vec<Command>) {
        let Some(character) = self.characters.get_mut(name) else {
            return;
        };
        if target.sprite != character.sprite
            && let Some(path) = &target.sprite
        {
            out.push(Command::SetCharacterSprite {
                name: name.to_string(),
                path: path.clone(),
            });
        }
        character.sprite = target.sprite;
        character.position = target.position;
        character.scale = target.scale;
        out.push(transform_command(character));
    }

    fn set_alpha(&mut self, name: &str, alpha: f32, out: &mut Vec<Command>) {
        if let Some(character) = self.characters.get_mut(name) {
            character.alpha = alpha;
            out.push(Command::SetCharacterAlpha {
                name: name.to_string(),
                alpha,
            });
        }
    }
}

fn apply_change(
    current: &Character,
    sprite: Option<String>,
    change: &CharacterChange,
) -> Appearance {
    Appearance {
        sprite: sprite.or_else(|| current.sprite.clone()),
        position: Vec2::new(
            change.x.unwrap_or(current.position.x),
            change.y.unwrap_or(current.position.y),
        ),
        scale: Vec2::new(
            change.scale_x.unwrap_or(current.scale.x),
            change.scale_y.unwrap_or(current.scale.y),
        ),
    }
}

fn transform_command(character: &Character) -> Command {
    Command::SetCharacterTransform {
        name: character.name.clone(),
        position: character.position,
        scale: character.scale,
    }
}

fn unknown(name: &str) -> RuntimeError {
    RuntimeError::UnknownCharacter {
        name: name.to_string(),
    }
}
