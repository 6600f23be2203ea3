//! # route-play
//!
//! ```text
//! route-play play <script.json> [--auto] [--choices 0,1] [--config config.json]
//! route-play check <path>
//! route-play init-config [path] [--force]
//! ```
//!
//! 日志输出到 stderr，级别由 `RUST_LOG` 或 `-v` 控制。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use host_cli::{HostConfig, PlayOptions, Player, check_path};
use route_runtime::{DialogueRuntime, ScriptLoader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "route-play", version, about = "视觉小说对话脚本播放器")]
struct Cli {
    /// 提高日志级别（-v: debug，-vv: trace）
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 播放脚本
    Play {
        /// 脚本文件（JSON）
        script: PathBuf,

        /// 配置文件
        #[arg(long, default_value = "config.json")]
        config: PathBuf,

        /// 自动推进
        #[arg(long)]
        auto: bool,

        /// 预设选项序列，如 `0,1,0`
        #[arg(long, value_delimiter = ',')]
        choices: Vec<usize>,

        /// 覆盖配置中的帧率
        #[arg(long)]
        fps: Option<u32>,
    },

    /// 检查脚本文件或目录
    Check { path: PathBuf },

    /// 写出默认配置文件
    InitConfig {
        #[arg(default_value = "config.json")]
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match real_main(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("route-play error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8, configured: &str) {
    let level = match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn real_main(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Play {
            script,
            config,
            auto,
            choices,
            fps,
        } => {
            let (mut host_config, load_error) = HostConfig::load(&config);
            init_logging(cli.verbose, &host_config.log_level);
            match load_error {
                None => info!(path = %config.display(), "配置文件加载成功"),
                Some(e) => warn!(path = %config.display(), error = %e, "使用默认配置"),
            }

            if let Some(fps) = fps {
                host_config.fps = fps;
            }
            host_config.validate()?;
            play(&script, host_config, PlayOptions { auto, choices })?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { path } => {
            init_logging(cli.verbose, "info");
            let report = check_path(&path)?;
            report.print(&mut std::io::stdout().lock(), cli.verbose > 0)?;
            Ok(if report.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Commands::InitConfig { path, force } => {
            init_logging(cli.verbose, "info");
            if path.exists() && !force {
                anyhow::bail!("{} 已存在，使用 --force 覆盖", path.display());
            }
            HostConfig::default().save(&path)?;
            info!(path = %path.display(), "已写出默认配置");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn play(path: &Path, config: HostConfig, options: PlayOptions) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取脚本: {}", path.display()))?;

    let script_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut loader = ScriptLoader::new();
    let script = loader
        .load_str(&script_id, &text)
        .with_context(|| format!("无法加载脚本: {}", path.display()))?;
    for warning in loader.warnings() {
        eprintln!("{}", warning);
    }

    info!(script = %script_id, routes = script.len(), "脚本加载完成");

    let runtime = DialogueRuntime::with_config(script, config.runtime.clone());
    let mut player = Player::new(runtime, config, options);
    let summary = player.run(&mut std::io::stdin().lock(), &mut std::io::stdout().lock())?;

    info!(
        frames = summary.frames,
        lines = summary.lines,
        reason = ?summary.reason,
        "播放结束"
    );
    Ok(())
}
