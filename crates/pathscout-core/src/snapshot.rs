//! 快照写出（整块写入临时文件后原子替换）
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tempfile::Builder;

/// 快照头部时间格式
pub const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 渲染快照文本：首行为头部，其后每行一个路径，末尾不带换行
pub fn render(root_description: &str, captured_at: &DateTime<Local>, records: &[PathBuf]) -> String {
    let mut out = format!(
        "Current state of {} as of {}\n",
        root_description,
        captured_at.format(HEADER_TIME_FORMAT)
    );
    let body: Vec<String> = records.iter().map(|p| p.display().to_string()).collect();
    out.push_str(&body.join("\n"));
    out
}

/// 写出快照并替换 `sink`。
/// 先在同目录创建临时文件写入全部内容，再 rename 覆盖，读者只会看到旧文件或新文件。
pub fn write(
    sink: &Path,
    root_description: &str,
    captured_at: &DateTime<Local>,
    records: &[PathBuf],
) -> Result<()> {
    let content = render(root_description, captured_at, records);
    let dir = match sink.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = format!(
        ".{}.",
        sink.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    );

    let mut tmp = Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .with_context(|| format!("create temporary snapshot in {}", dir.display()))?;
    tmp.write_all(content.as_bytes()).context("write snapshot")?;
    tmp.as_file().sync_all().context("flush snapshot")?;
    tmp.persist(sink)
        .map_err(|e| e.error)
        .with_context(|| format!("replace {}", sink.display()))?;
    Ok(())
}

/// 删除快照文件；文件不存在返回 Ok(false)
pub fn remove(sink: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(sink) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
