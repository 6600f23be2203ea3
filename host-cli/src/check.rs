//! # Check 模块
//!
//! 静态检查脚本文件：加载错误、参数警告、结构诊断、资源文件是否存在。
//!
//! 资源路径相对于脚本文件所在目录解析。

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use route_runtime::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, ScriptLoader, analyze_script,
    extract_resource_references,
};
use walkdir::WalkDir;

/// 缺失的资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingAsset {
    pub script_id: String,
    pub kind: String,
    pub path: String,
}

/// 检查报告
#[derive(Debug, Default)]
pub struct CheckReport {
    pub scripts_checked: usize,
    pub load_errors: usize,
    pub diagnostics: DiagnosticResult,
    pub missing_assets: Vec<MissingAsset>,
}

impl CheckReport {
    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }

    pub fn warn_count(&self) -> usize {
        self.diagnostics.warn_count() + self.missing_assets.len()
    }

    pub fn is_ok(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    fn load_failed(&mut self, script_id: &str, message: String) {
        self.load_errors += 1;
        self.diagnostics.push(Diagnostic::error(script_id, message));
    }

    /// 输出报告
    ///
    /// `verbose` 为 false 时不输出 Info 级别的诊断。
    pub fn print(&self, out: &mut impl Write, verbose: bool) -> std::io::Result<()> {
        let min_level = if verbose {
            DiagnosticLevel::Info
        } else {
            DiagnosticLevel::Warn
        };
        for diag in self.diagnostics.at_least(min_level) {
            writeln!(out, "{}", diag)?;
        }
        for missing in &self.missing_assets {
            writeln!(
                out,
                "[WARN] {}: 资源不存在 [{}] {}",
                missing.script_id, missing.kind, missing.path
            )?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "检查完成: {} 个脚本，{} 个错误，{} 个警告",
            self.scripts_checked,
            self.error_count(),
            self.warn_count()
        )
    }
}

/// 收集脚本文件（`.json`，递归，按路径排序）
pub fn collect_script_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("路径不存在: {}", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("遍历目录失败: {}", path.display()))?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// 检查文件或目录
pub fn check_path(path: &Path) -> anyhow::Result<CheckReport> {
    let mut report = CheckReport::default();
    for file in collect_script_files(path)? {
        check_file(&file, &mut report);
    }
    Ok(report)
}

/// 检查单个脚本文件
pub fn check_file(file: &Path, report: &mut CheckReport) {
    let script_id = file.display().to_string();
    report.scripts_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            report.load_failed(&script_id, format!("无法读取文件: {}", e));
            return;
        }
    };

    let mut loader = ScriptLoader::new();
    let script = match loader.load_str(&script_id, &content) {
        Ok(s) => s,
        Err(e) => {
            report.load_failed(&script_id, e.to_string());
            return;
        }
    };

    report.diagnostics.merge(loader.warnings().iter().cloned());
    report.diagnostics.merge(analyze_script(&script));

    let base = file.parent().unwrap_or_else(|| Path::new("."));
    for reference in extract_resource_references(&script) {
        if !base.join(&reference.path).exists() {
            report.missing_assets.push(MissingAsset {
                script_id: script_id.clone(),
                kind: reference.kind.to_string(),
                path: reference.path,
            });
        }
    }
}
