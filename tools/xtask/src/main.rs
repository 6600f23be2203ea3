//! # xtask - 开发辅助工具
//!
//! ```text
//! cargo xtask check-all              fmt + clippy + test
//! cargo xtask cov-runtime            route-runtime 覆盖率
//! cargo xtask cov-workspace          workspace 覆盖率（不含 xtask）
//! cargo xtask script-check [path]    route-play check，默认检查 host-cli/assets
//! ```

use std::process::{Command, ExitCode};

const DEFAULT_SCRIPTS_DIR: &str = "host-cli/assets";
const COVERAGE_REPORT: &str = "target/llvm-cov/html/index.html";

enum Task {
    CheckAll,
    CovRuntime,
    CovWorkspace,
    ScriptCheck { path: String },
    Help,
}

impl Task {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let task = match args.next().as_deref() {
            Some("check-all") => Self::CheckAll,
            Some("cov-runtime") => Self::CovRuntime,
            Some("cov-workspace") => Self::CovWorkspace,
            Some("script-check") => Self::ScriptCheck {
                path: args.next().unwrap_or_else(|| DEFAULT_SCRIPTS_DIR.into()),
            },
            None | Some("help" | "-h" | "--help") => Self::Help,
            Some(other) => anyhow::bail!("unknown xtask subcommand: {other}"),
        };
        Ok(task)
    }
}

fn main() -> ExitCode {
    let result = Task::parse(std::env::args().skip(1)).and_then(run_task);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("xtask error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run_task(task: Task) -> anyhow::Result<()> {
    match task {
        Task::CheckAll => {
            cargo(&["fmt", "--all", "--", "--check"])?;
            cargo(&["clippy", "--workspace", "--all-targets"])?;
            cargo(&["test", "--workspace"])?;
        }
        Task::CovRuntime => {
            require_llvm_cov()?;
            cargo(&["llvm-cov", "-p", "route-runtime", "--html"])?;
            eprintln!("\nCoverage HTML: {COVERAGE_REPORT}");
        }
        Task::CovWorkspace => {
            require_llvm_cov()?;
            cargo(&["llvm-cov", "--workspace", "--exclude", "xtask", "--html"])?;
            eprintln!("\nCoverage HTML: {COVERAGE_REPORT}");
        }
        Task::ScriptCheck { path } => {
            route_play(&["check", &path])?;
        }
        Task::Help => print_help(),
    }
    Ok(())
}

/// 通过 cargo 运行 route-play
fn route_play(args: &[&str]) -> anyhow::Result<()> {
    let mut full = vec!["run", "-q", "-p", "host-cli", "--bin", "route-play", "--"];
    full.extend_from_slice(args);
    cargo(&full)
}

/// 运行一条 cargo 命令，非零退出视为失败
fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let step = format!("cargo {}", args.join(" "));
    eprintln!("\n==> {step}");
    let status = Command::new("cargo").args(args).status()?;
    anyhow::ensure!(status.success(), "{step} failed with {status}");
    Ok(())
}

fn require_llvm_cov() -> anyhow::Result<()> {
    let available = Command::new("cargo")
        .args(["llvm-cov", "--version"])
        .output()
        .is_ok_and(|out| out.status.success());
    anyhow::ensure!(
        available,
        "未找到 cargo-llvm-cov，安装方式：\n  \
         cargo install cargo-llvm-cov\n  \
         rustup component add llvm-tools-preview"
    );
    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all            fmt、clippy、test 门禁
  cov-runtime          route-runtime 覆盖率报告
  cov-workspace        workspace 覆盖率报告
  script-check [path]  检查脚本文件或目录（默认 {DEFAULT_SCRIPTS_DIR}）

script-check 报告：
  - 结构错误（重复 id、悬空的 Route 引用），存在即失败
  - 事件参数警告
  - 不可达 Route、被忽略的 next_route、未登场角色、越界资源索引
  - 不存在的资源文件（相对于脚本所在目录）

ALIASES (.cargo/config.toml):
  cargo check-all / cov-runtime / cov-workspace / script-check
"#
    );
}
