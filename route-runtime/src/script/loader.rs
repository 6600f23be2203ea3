//! # Loader 模块
//!
//! 将 JSON 创作数据加载为 [`Script`]。
//!
//! ## 流程
//!
//! ```text
//! JSON 文本 → RawScript（serde） → 事件参数校验 → Script::new（引用校验）
//! ```
//!
//! 结构错误（无 Route、重复 id、悬空引用）直接返回 [`ContentError`]；
//! 事件参数错误只记录为警告，事件被跳过或降级，加载继续。

use serde::Deserialize;
use tracing::warn;

use crate::diagnostic::Diagnostic;
use crate::error::ContentError;
use crate::script::event::{Event, RawEvent};
use crate::script::model::{
    AssetCatalog, Choice, DialogueLine, OutroEffect, Route, Script, TextEffect,
};

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    start_route: Option<String>,
    #[serde(default)]
    assets: AssetCatalog,
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    #[serde(default)]
    id: String,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    lines: Vec<RawLine>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    next_route: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLine {
    #[serde(default)]
    speaker: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    effect: TextEffect,
    #[serde(default)]
    duration: Option<f32>,
    #[serde(default)]
    additive: bool,
    #[serde(default)]
    outro: OutroEffect,
    #[serde(default)]
    events: Vec<RawEvent>,
}

/// 脚本加载器
#[derive(Debug, Default)]
pub struct ScriptLoader {
    /// 加载过程中的警告
    warnings: Vec<Diagnostic>,
}

impl ScriptLoader {
    /// 创建新的加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 文本加载脚本
    ///
    /// # 参数
    ///
    /// - `script_id`: 脚本标识符
    /// - `text`: JSON 文本
    pub fn load_str(&mut self, script_id: &str, text: &str) -> Result<Script, ContentError> {
        self.warnings.clear();

        let invalid = |e: serde_json::Error| ContentError::InvalidFormat {
            script: script_id.to_string(),
            message: e.to_string(),
        };
        let raw: RawScript = serde_json::from_str(text).map_err(invalid)?;

        let routes = raw
            .routes
            .into_iter()
            .map(|r| self.convert_route(script_id, r))
            .collect();

        let script = Script::new(script_id, raw.start_route, routes)?.with_assets(raw.assets);
        Ok(script)
    }

    /// 获取加载过程中的警告
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    fn convert_route(&mut self, script_id: &str, raw: RawRoute) -> Route {
        let lines = raw
            .lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| self.convert_line(script_id, &raw.id, i + 1, line))
            .collect();

        Route {
            id: raw.id,
            question: raw.question,
            lines,
            choices: raw.choices,
            next_route: raw.next_route,
        }
    }

    fn convert_line(
        &mut self,
        script_id: &str,
        route_id: &str,
        line_no: usize,
        raw: RawLine,
    ) -> DialogueLine {
        let mut events = Vec::with_capacity(raw.events.len());
        for raw_event in &raw.events {
            let (event, problems) = Event::from_raw(raw_event);
            for problem in problems {
                let action = if event.is_some() { "已降级" } else { "已跳过" };
                warn!(
                    script = %script_id,
                    route = %route_id,
                    line = line_no,
                    error = %problem,
                    "事件参数无效，{}",
                    action
                );
                let detail = format!("{}: {:?}", raw_event.command, raw_event.params);
                self.warnings.push(
                    Diagnostic::warn(script_id, problem.to_string())
                        .with_route(route_id)
                        .with_line(line_no)
                        .with_detail(detail),
                );
            }
            events.extend(event);
        }

        DialogueLine {
            speaker: raw.speaker,
            content: raw.content,
            effect: raw.effect,
            duration: raw.duration,
            additive: raw.additive,
            outro: raw.outro,
            events,
        }
    }
}
