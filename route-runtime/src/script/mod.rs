//! # Script 模块
//!
//! 创作数据：模型定义、事件与 JSON 加载。
//!
//! ## 模块结构
//!
//! - [`model`]：Script / Route / DialogueLine 定义
//! - [`event`]：强类型事件与原始事件
//! - [`params`]：事件参数的宽松解析
//! - [`loader`]：JSON 加载器

pub mod event;
pub mod loader;
pub mod model;
pub mod params;

pub use event::{CharacterChange, Event, EventKind, RawEvent};
pub use loader::ScriptLoader;
pub use model::*;
