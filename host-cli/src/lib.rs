//! # host-cli
//!
//! route-runtime 的无头宿主：在终端中播放脚本，或静态检查脚本文件。

pub mod check;
pub mod config;
pub mod player;
pub mod view;

pub use check::{CheckReport, check_path};
pub use config::{ConfigError, HostConfig};
pub use player::{PlayOptions, PlaySummary, Player, StopReason};
pub use view::{CommandExecutor, HostView};
