//! # Diagnostic 模块
//!
//! 脚本的静态检查。只读取 [`Script`]，不访问文件系统。
//!
//! 加载器记录的参数问题与 [`analyze_script`] 的结构问题共用 [`Diagnostic`]，
//! Host 可以把两者合并到同一个 [`DiagnosticResult`] 中输出。

use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::script::{AssetKind, Event, Script};

/// 诊断级别（按严重程度排序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    Info,
    Warn,
    /// 脚本无法加载
    Error,
}

impl DiagnosticLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// 脚本 id 或文件路径
    pub script_id: String,
    pub route: Option<String>,
    /// Route 内的台词序号（从 1 开始）
    pub line: Option<usize>,
    pub message: String,
    /// 附加说明，单独成行输出
    pub detail: Option<String>,
}

impl Diagnostic {
    fn new(
        level: DiagnosticLevel,
        script_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            script_id: script_id.into(),
            route: None,
            line: None,
            message: message.into(),
            detail: None,
        }
    }

    pub fn error(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, script_id, message)
    }

    pub fn warn(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, script_id, message)
    }

    pub fn info(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, script_id, message)
    }

    pub fn with_route(self, route: impl Into<String>) -> Self {
        Self {
            route: Some(route.into()),
            ..self
        }
    }

    pub fn with_line(self, line: usize) -> Self {
        Self {
            line: Some(line),
            ..self
        }
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..self
        }
    }
}

/// `[WARN] script/route#line: message`
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.script_id)?;
        if let Some(route) = &self.route {
            write!(f, "/{route}")?;
        }
        if let Some(line) = self.line {
            write!(f, "#{line}")?;
        }
        write!(f, ": {}", self.message)?;
        match &self.detail {
            Some(detail) => write!(f, "\n  | {detail}"),
            None => Ok(()),
        }
    }
}

/// 诊断集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 并入其他诊断（加载器警告、其他脚本的结果）
    pub fn merge(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 不低于 `level` 的条目
    pub fn at_least(&self, level: DiagnosticLevel) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.level >= level)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }
}

impl From<Vec<Diagnostic>> for DiagnosticResult {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl IntoIterator for DiagnosticResult {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

/// 事件引用的资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    pub kind: AssetKind,
    pub index: usize,
    /// 资源目录中登记的路径
    pub path: String,
}

/// 结构检查
///
/// 报告：
/// - 从起始 Route 不可达的 Route
/// - 同时设置了选项和 `next_route` 的 Route（`next_route` 不生效）
/// - 越界的资源索引
/// - 在任何 `AddOrChangeCharacter` 之前从未登场的角色名
/// - 终点 Route（信息提示）
pub fn analyze_script(script: &Script) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    let reachable = reachable_routes(script);
    for route in &script.routes {
        if !reachable.contains(route.id.as_str()) {
            let message = "Route 从起始 Route 不可达";
            result.push(Diagnostic::warn(&script.id, message).with_route(&route.id));
        }

        if route.has_choices() && route.next_route.is_some() {
            let diagnostic = Diagnostic::warn(&script.id, "Route 同时设置了选项和 next_route")
                .with_route(&route.id)
                .with_detail("存在选项时 next_route 不会生效");
            result.push(diagnostic);
        }

        if !route.has_choices() && route.next_route.is_none() {
            result.push(Diagnostic::info(&script.id, "终点 Route").with_route(&route.id));
        }
    }

    let introduced: HashSet<&str> = script
        .routes
        .iter()
        .flat_map(|r| r.lines.iter())
        .flat_map(|l| l.events.iter())
        .filter_map(|e| match e {
            Event::AddOrChangeCharacter { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();

    for route in &script.routes {
        for (i, line) in route.lines.iter().enumerate() {
            for event in &line.events {
                if let Some((kind, index)) = asset_index(event)
                    && let Err(e) = script.assets.resolve(kind, index)
                {
                    result.push(
                        Diagnostic::warn(&script.id, e.to_string())
                            .with_route(&route.id)
                            .with_line(i + 1),
                    );
                }

                if let Some(name) = event.character()
                    && !introduced.contains(name)
                {
                    let message = format!("角色 '{}' 从未通过 AddOrChangeCharacter 登场", name);
                    result.push(
                        Diagnostic::warn(&script.id, message)
                            .with_route(&route.id)
                            .with_line(i + 1),
                    );
                }
            }
        }
    }

    result
}

/// 从起始 Route 出发可达的所有 Route（含选项边与 next_route 边）
pub fn reachable_routes(script: &Script) -> HashSet<&str> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([script.start_route.as_str()]);

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(route) = script.route(id) {
            queue.extend(route.choices.iter().map(|c| c.target.as_str()));
            queue.extend(route.fallthrough());
        }
    }

    visited
}

/// 事件引用的资源（类别, 索引）
fn asset_index(event: &Event) -> Option<(AssetKind, usize)> {
    match event {
        Event::PlayBgm { index, .. } => Some((AssetKind::Bgm, *index)),
        Event::PlaySfx { index, .. } => Some((AssetKind::Sfx, *index)),
        Event::ChangeBackground { index, .. } => Some((AssetKind::Background, *index)),
        Event::AddOrChangeCharacter { change, .. } => {
            change.sprite.map(|index| (AssetKind::Sprite, index))
        }
        _ => None,
    }
}

/// 提取脚本中所有可解析的资源引用
///
/// 越界索引不在此列（由 [`analyze_script`] 报告）。
pub fn extract_resource_references(script: &Script) -> Vec<ResourceReference> {
    let mut refs: Vec<ResourceReference> = Vec::new();
    let events = script
        .routes
        .iter()
        .flat_map(|r| r.lines.iter())
        .flat_map(|l| l.events.iter());

    for event in events {
        let Some((kind, index)) = asset_index(event) else {
            continue;
        };
        let Ok(path) = script.assets.resolve(kind, index) else {
            continue;
        };
        if !refs.iter().any(|r| r.kind == kind && r.index == index) {
            refs.push(ResourceReference {
                kind,
                index,
                path: path.to_string(),
            });
        }
    }

    refs
}
