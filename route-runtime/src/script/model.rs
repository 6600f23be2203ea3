//! # Model 模块
//!
//! 脚本的结构化表示：Script → Route → DialogueLine → Event。
//!
//! ## 设计说明
//!
//! 模型是只读的创作数据，运行期不会被修改。
//! 构造 [`Script`] 时校验 Route 引用的完整性，之后导航器可以放心按 id 查找。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ContentError, RuntimeError};
use crate::script::event::Event;

/// 文本出场效果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEffect {
    /// 立即显示
    #[default]
    Normal,
    /// 逐字显示
    Typewriter,
    /// 整体淡入
    FadeIn,
}

/// 文本退场效果
///
/// 作用于下一句台词出现之前：旧文本先淡出，再开始新台词的出场效果。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum OutroEffect {
    /// 直接替换
    #[default]
    Normal,
    /// 淡出（秒）
    FadeOut(f32),
}

/// 资源类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// 背景音乐
    Bgm,
    /// 音效
    Sfx,
    /// 背景图片
    Background,
    /// 角色立绘
    Sprite,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bgm => write!(f, "BGM"),
            Self::Sfx => write!(f, "SFX"),
            Self::Background => write!(f, "背景"),
            Self::Sprite => write!(f, "立绘"),
        }
    }
}

/// 资源目录
///
/// 事件通过索引引用资源，这里只保存索引到资源路径的映射。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetCatalog {
    #[serde(default)]
    pub bgm: Vec<String>,
    #[serde(default)]
    pub sfx: Vec<String>,
    #[serde(default)]
    pub backgrounds: Vec<String>,
    #[serde(default)]
    pub sprites: Vec<String>,
}

impl AssetCatalog {
    /// 获取某一类资源列表
    pub fn list(&self, kind: AssetKind) -> &[String] {
        match kind {
            AssetKind::Bgm => &self.bgm,
            AssetKind::Sfx => &self.sfx,
            AssetKind::Background => &self.backgrounds,
            AssetKind::Sprite => &self.sprites,
        }
    }

    /// 按索引解析资源路径
    pub fn resolve(&self, kind: AssetKind, index: usize) -> Result<&str, RuntimeError> {
        let list = self.list(kind);
        list.get(index)
            .map(String::as_str)
            .ok_or(RuntimeError::AssetIndexOutOfRange {
                kind,
                index,
                len: list.len(),
            })
    }
}

/// 选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// 选项显示文本
    pub label: String,
    /// 目标 Route id
    pub target: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
        }
    }
}

/// 一句台词
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueLine {
    /// 说话者（None 表示旁白）
    pub speaker: Option<String>,
    /// 台词内容
    pub content: String,
    /// 出场效果
    pub effect: TextEffect,
    /// 效果参数
    ///
    /// - `FadeIn`：淡入时长（秒）
    /// - `Typewriter`：每个字的间隔（秒），None 时使用运行时默认值
    pub duration: Option<f32>,
    /// 追加到当前文本之后，而不是替换
    pub additive: bool,
    /// 退场效果
    pub outro: OutroEffect,
    /// 台词显示时触发的事件（按顺序）
    pub events: Vec<Event>,
}

impl DialogueLine {
    /// 创建一句普通台词
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            speaker: None,
            content: content.into(),
            effect: TextEffect::Normal,
            duration: None,
            additive: false,
            outro: OutroEffect::Normal,
            events: Vec::new(),
        }
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn with_effect(mut self, effect: TextEffect, duration: Option<f32>) -> Self {
        self.effect = effect;
        self.duration = duration;
        self
    }

    pub fn additive(mut self) -> Self {
        self.additive = true;
        self
    }

    pub fn with_outro(mut self, outro: OutroEffect) -> Self {
        self.outro = outro;
        self
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }
}

/// Route：一段线性台词，结尾可以分支
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// 唯一标识
    pub id: String,
    /// 进入选择时显示的问题文本
    pub question: Option<String>,
    /// 台词列表
    pub lines: Vec<DialogueLine>,
    /// 结尾选项
    pub choices: Vec<Choice>,
    /// 没有选项时自动进入的下一个 Route
    pub next_route: Option<String>,
}

impl Route {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: None,
            lines: Vec::new(),
            choices: Vec::new(),
            next_route: None,
        }
    }

    pub fn with_line(mut self, line: DialogueLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next_route = Some(next.into());
        self
    }

    /// 结尾是否为选择
    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }

    /// 实际生效的下一个 Route
    ///
    /// 有选项时 `next_route` 不生效。
    pub fn fallthrough(&self) -> Option<&str> {
        if self.has_choices() {
            None
        } else {
            self.next_route.as_deref()
        }
    }

    /// 台词数量
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 该 Route 引用的所有目标（选项目标与 next_route）
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.choices
            .iter()
            .map(|c| c.target.as_str())
            .chain(self.next_route.as_deref())
    }
}

/// 完整脚本
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// 脚本标识符
    pub id: String,
    /// 起始 Route id
    pub start_route: String,
    /// 资源目录
    pub assets: AssetCatalog,
    /// 所有 Route（按创作顺序）
    pub routes: Vec<Route>,
    /// id -> routes 下标
    index: HashMap<String, usize>,
}

impl Script {
    /// 创建脚本并校验 Route 引用
    ///
    /// `start_route` 为 None 时使用第一个 Route。
    pub fn new(
        id: impl Into<String>,
        start_route: Option<String>,
        routes: Vec<Route>,
    ) -> Result<Self, ContentError> {
        let id = id.into();

        let Some(first) = routes.first() else {
            return Err(ContentError::EmptyScript { script: id });
        };
        let start_route = start_route.unwrap_or_else(|| first.id.clone());

        let mut index = HashMap::with_capacity(routes.len());
        for (i, route) in routes.iter().enumerate() {
            if route.id.trim().is_empty() {
                return Err(ContentError::MissingRouteId {
                    script: id.clone(),
                    index: i,
                });
            }
            if index.insert(route.id.clone(), i).is_some() {
                return Err(ContentError::DuplicateRoute {
                    route: route.id.clone(),
                });
            }
        }

        if !index.contains_key(&start_route) {
            return Err(ContentError::MissingStartRoute { route: start_route });
        }

        for route in &routes {
            if let Some(target) = route.targets().find(|t| !index.contains_key(*t)) {
                return Err(ContentError::DanglingRoute {
                    from: route.id.clone(),
                    target: target.to_string(),
                });
            }
        }

        Ok(Self {
            id,
            start_route,
            assets: AssetCatalog::default(),
            routes,
            index,
        })
    }

    /// 设置资源目录
    pub fn with_assets(mut self, assets: AssetCatalog) -> Self {
        self.assets = assets;
        self
    }

    /// 按 id 获取 Route
    pub fn route(&self, id: &str) -> Option<&Route> {
        self.index.get(id).map(|&i| &self.routes[i])
    }

    /// 起始 Route
    pub fn start(&self) -> &Route {
        // 构造时已校验起始 Route 存在
        &self.routes[self.index[&self.start_route]]
    }

    /// Route 数量
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
