//! # Route Runtime
//!
//! 视觉小说对话与演出的核心运行时库。
//!
//! ## 架构概述
//!
//! `route-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 它通过 **命令驱动模式** 与宿主层（Host）通信：
//!
//! ```text
//! Host                                Runtime
//!   │                                    │
//!   │──── RuntimeInput ────────────────►│ handle_input()
//!   │──── dt ──────────────────────────►│ tick()
//!   │◄─── Vec<Command> ─────────────────│
//!   │                                    │
//! ```
//!
//! ## 核心类型
//!
//! - [`Script`]：创作数据（Route / 台词 / 事件 / 资源目录）
//! - [`DialogueRuntime`]：Route 导航器
//! - [`Command`]：Runtime 向 Host 发出的指令
//! - [`RuntimeInput`]：Host 向 Runtime 传递的输入
//! - [`WaitingReason`]：Runtime 的等待状态
//!
//! ## 使用示例
//!
//! ```ignore
//! use route_runtime::{DialogueRuntime, RuntimeInput, ScriptLoader};
//!
//! let script = ScriptLoader::new().load_str("demo", &text)?;
//! let mut runtime = DialogueRuntime::new(script);
//!
//! loop {
//!     let mut commands = runtime.tick(frame_dt);
//!     if clicked {
//!         commands.extend(runtime.handle_input(RuntimeInput::Advance));
//!     }
//!     for cmd in commands {
//!         host.execute(cmd);
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`script`]：模型与 JSON 加载
//! - [`runtime`]：导航器与事件分发
//! - [`presentation`]：文本呈现状态机
//! - [`stage`]：角色舞台
//! - [`state`]：可序列化的播放状态
//! - [`diagnostic`]：静态检查
//! - [`history`]：回看记录

pub mod command;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod history;
pub mod input;
pub mod presentation;
pub mod runtime;
pub mod script;
pub mod stage;
pub mod state;

// 重导出核心类型
pub use command::{Command, Vec2};
pub use config::RuntimeConfig;
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, ResourceReference, analyze_script,
    extract_resource_references, reachable_routes,
};
pub use error::{ContentError, EventParameterError, RuntimeError};
pub use history::{History, HistoryEvent};
pub use input::RuntimeInput;
pub use presentation::{TextPresenter, TransitionKind};
pub use runtime::{DialogueRuntime, EventDispatcher};
pub use script::{
    AssetCatalog, AssetKind, Choice, DialogueLine, Event, OutroEffect, RawEvent, Route, Script,
    ScriptLoader, TextEffect,
};
pub use stage::{Character, CharacterStage};
pub use state::{AudioState, PlaybackState, WaitingReason};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let script = Script::new("main", None, vec![Route::new("start")]).unwrap();
        let mut runtime = DialogueRuntime::new(script);

        assert_eq!(runtime.waiting(), WaitingReason::WaitForClick);
        let commands = runtime.handle_input(RuntimeInput::Advance);
        assert_eq!(
            commands,
            vec![Command::RouteEnded {
                route: "start".to_string()
            }]
        );
    }
}
