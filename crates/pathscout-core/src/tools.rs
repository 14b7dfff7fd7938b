//! 一次性的辅助命令：查找文件、查找文本、存在性检查、创建目录、UTC 时间
//!
//! 所有输出都经由 `StatusSink`；功能开关由调用方先行检查。
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::cancel::StopCheck;
use crate::content::ContentFilter;
use crate::error::{Result, ScoutError};
use crate::options::{DepthLimit, WalkOptions};
use crate::pattern::PatternSet;
use crate::status::StatusSink;
use crate::walker;

/// 在 `root` 下按掩码（及可选内容）查找文件，输出绝对路径；返回命中数
pub fn find_files(
    root: &Path,
    masks: &str,
    contains: Option<&str>,
    depth: DepthLimit,
    status: &dyn StatusSink,
) -> Result<usize> {
    let masks = PatternSet::parse_list(masks);
    if masks.is_empty() {
        return Err(ScoutError::InvalidInput("no file mask specified for find-file".into()));
    }
    let contains = ContentFilter::from_optional(contains)?;
    let root = walker::absolutize(root)?;
    if !root.is_dir() {
        return Err(ScoutError::NotFound(root));
    }

    status.emit(&format!(
        "Searching for files matching '{}' (depth: {})...",
        masks.as_strings().join(", "),
        depth.effective()
    ));
    if let Some(filter) = &contains {
        status.emit(&format!("Filtering by content: '{}'", filter.needle()));
    }
    status.blank();

    let opts = WalkOptions {
        depth,
        masks,
        contains,
        include_dirs: false,
        skip_hidden_dirs: false,
        ..WalkOptions::default()
    };
    let (files, stats) = walker::walk(&root, &opts, &StopCheck::unbounded());
    info!(root = %root.display(), dirs = stats.dirs_visited, found = files.len(), "find-file finished");

    if files.is_empty() {
        status.emit("No matching files found.");
    } else {
        for f in &files {
            status.emit(&f.display().to_string());
        }
        status.blank();
        status.emit(&format!("Total: {} file(s) found", files.len()));
    }
    Ok(files.len())
}

/// 输出文件中所有包含 `needle` 的行（带行号）；返回命中行数
pub fn find_text(file: &Path, needle: &str, status: &dyn StatusSink) -> Result<usize> {
    let filter = ContentFilter::new(needle)?;
    let path = walker::absolutize(file)?;
    if !path.is_file() {
        return Err(ScoutError::NotFound(path));
    }

    status.emit(&format!("Searching for '{}' in {}:", needle, path.display()));
    status.blank();

    let reader = BufReader::new(File::open(&path)?);
    let hits = filter.for_each_match(reader, |n, line| status.emit(&format!("Line {n}: {line}")))?;

    if hits == 0 {
        status.emit(&format!("No matches found for '{needle}'"));
    } else {
        status.blank();
        status.emit(&format!("Total: {hits} match(es) found"));
    }
    Ok(hits)
}

/// 检查对象的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Dir,
}

/// 输出 `exists` 或 `missing`；返回是否存在
pub fn check_path(path: &Path, kind: PathKind, status: &dyn StatusSink) -> Result<bool> {
    if path.as_os_str().is_empty() {
        return Err(ScoutError::InvalidInput("no path specified".into()));
    }
    let path = walker::absolutize(path)?;
    let exists = match kind {
        PathKind::File => path.is_file(),
        PathKind::Dir => path.is_dir(),
    };
    status.emit(if exists { "exists" } else { "missing" });
    Ok(exists)
}

/// 创建目录（含父目录）；返回是否新建
pub fn make_dir(path: &Path, status: &dyn StatusSink) -> Result<bool> {
    if path.as_os_str().is_empty() {
        return Err(ScoutError::InvalidInput("no path specified for mkdir".into()));
    }
    let path = walker::absolutize(path)?;
    if path.is_dir() {
        status.emit(&format!("Directory already exists: {}", path.display()));
        return Ok(false);
    }
    std::fs::create_dir_all(&path)?;
    status.emit(&format!("Directory created: {}", path.display()));
    Ok(true)
}

/// ISO 8601 的 UTC 时间，精确到秒
pub fn format_utc(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn print_utc_now(status: &dyn StatusSink) {
    status.emit(&format_utc(Utc::now()));
}
