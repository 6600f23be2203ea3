//! # Config 模块
//!
//! 播放器配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件（JSON）
//! 3. 默认值（最低）

use route_runtime::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 播放器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 模拟帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 自动推进模式下，文本显示完成后的停留时间（秒）
    #[serde(default = "default_auto_advance_delay")]
    pub auto_advance_delay: f32,

    /// 最多运行的帧数，防止循环剧情无限播放
    #[serde(default = "default_max_frames")]
    pub max_frames: u64,

    /// 日志级别（EnvFilter 语法，如 `info` 或 `route_runtime=debug`）
    ///
    /// `RUST_LOG` 和 `-v` 优先。
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 运行时配置
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

fn default_fps() -> u32 {
    60
}

fn default_auto_advance_delay() -> f32 {
    1.0
}

fn default_max_frames() -> u64 {
    // 60 帧下约一小时
    216_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            auto_advance_delay: default_auto_advance_delay(),
            max_frames: default_max_frames(),
            log_level: default_log_level(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl HostConfig {
    /// 加载配置文件
    ///
    /// 文件不存在或解析失败时返回默认配置，同时返回错误，
    /// 由调用方在日志系统初始化之后记录。
    pub fn load(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        match Self::try_load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::SerializationFailed(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;
        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// 单帧时长（秒）
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 || self.fps > 1000 {
            return Err(ConfigError::ValidationFailed("fps 必须在 1 - 1000 之间".to_string()));
        }

        if !self.auto_advance_delay.is_finite() || self.auto_advance_delay < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "auto_advance_delay 必须是非负数".to_string(),
            ));
        }

        if self.max_frames == 0 {
            return Err(ConfigError::ValidationFailed("max_frames 必须大于 0".to_string()));
        }

        let runtime = &self.runtime;
        for (name, value) in [
            ("runtime.typewriter_delay", runtime.typewriter_delay),
            ("runtime.character_fade", runtime.character_fade),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationFailed(format!("{} 必须是非负数", name)));
            }
        }

        if runtime.history_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "runtime.history_capacity 必须大于 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    #[error("配置 IO 错误: {0}")]
    IoError(String),

    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.fps, 60);
        assert_eq!(config.max_frames, 216_000);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let config: HostConfig =
            serde_json::from_str(r#"{ "fps": 30, "runtime": { "typewriter_delay": 0.1 } }"#)
                .unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.runtime.typewriter_delay, 0.1);
        assert_eq!(config.runtime.character_fade, 0.25);
        assert_eq!(config.auto_advance_delay, 1.0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = HostConfig::default();

        config.fps = 0;
        assert!(config.validate().is_err());
        config.fps = 60;

        config.auto_advance_delay = -1.0;
        assert!(config.validate().is_err());
        config.auto_advance_delay = 0.5;

        config.runtime.character_fade = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(msg)) if msg.contains("character_fade")
        ));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, error) = HostConfig::load(dir.path().join("missing.json"));
        assert_eq!(config, HostConfig::default());
        assert!(matches!(error, Some(ConfigError::IoError(_))));
    }

    #[test]
    fn test_load_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "fps = 60").unwrap();

        let (config, error) = HostConfig::load(&path);
        assert_eq!(config, HostConfig::default());
        assert!(matches!(error, Some(ConfigError::SerializationFailed(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = HostConfig {
            fps: 24,
            log_level: "route_runtime=debug".to_string(),
            ..HostConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(HostConfig::load(&path), (config, None));
    }

    #[test]
    fn test_frame_dt() {
        let config = HostConfig {
            fps: 50,
            ..HostConfig::default()
        };
        assert_eq!(config.frame_dt(), 0.02);
    }
}
