//! # Runtime 模块
//!
//! 对话执行核心，负责 Route 导航和事件分发。
//!
//! ## 模块结构
//!
//! - [`engine`]：Route 导航器 [`DialogueRuntime`]
//! - [`dispatcher`]：台词事件到 Command 的转换

pub mod dispatcher;
pub mod engine;

pub use dispatcher::EventDispatcher;
pub use engine::DialogueRuntime;
