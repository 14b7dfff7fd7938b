//! 深度受限的目录树遍历
//!
//! 输出顺序为深度优先先序：目录自身 → 该目录下的文件 → 各子目录（按文件系统枚举顺序）。
//! 单个节点的错误（无权限、目录已消失等）只计数并跳过，不会中断整次遍历。
//! 每个条目边界都会检查截止时间与取消标志，命中则保留已收集的部分结果并返回。
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::cancel::StopCheck;
use crate::options::{WalkOptions, WalkStats};
/// 把路径补全为基于当前目录的绝对路径，并按词法去掉 `.` 与 `..`（不解析符号链接）
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}

/// `..` 回退一级，到达根后不再回退
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// 遍历 `root`，返回命中的路径列表与统计
pub fn walk(root: &Path, opts: &WalkOptions, stop: &StopCheck) -> (Vec<PathBuf>, WalkStats) {
    walk_observed(root, opts, stop, |_| {})
}

/// 同 [`walk`]，每条结果写入时回调 `on_record`
pub(crate) fn walk_observed(
    root: &Path,
    opts: &WalkOptions,
    stop: &StopCheck,
    mut on_record: impl FnMut(&Path),
) -> (Vec<PathBuf>, WalkStats) {
    let mut records = Vec::new();
    let mut stats = WalkStats::default();

    if stop.should_stop() {
        stats.interrupted = true;
        return (records, stats);
    }

    // 根目录总是写入结果，排除规则只作用于它的后代
    stats.dirs_visited += 1;
    if opts.include_dirs {
        records.push(root.to_path_buf());
        on_record(root);
    }

    let max_depth = opts.depth.effective();
    // walkdir 的深度以条目计：深度为 d 的目录，其文件位于 d + 1。
    // walkdir 在 filter_entry 判定之前就已打开并（因 sort_by）读完目录：
    // 被剪枝的隐藏/排除目录以及深度 max + 1 的目录每轮各有一次多余的读取，结果不受影响。
    let it = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth + 1)
        .follow_links(false)
        // 稳定排序：同一目录内文件在前、子目录在后，其余保持枚举顺序
        .sort_by(|a, b| a.file_type().is_dir().cmp(&b.file_type().is_dir()))
        .into_iter()
        .filter_entry(|e| !e.file_type().is_dir() || should_descend(e, max_depth, opts));

    for entry in it {
        if stop.should_stop() {
            stats.interrupted = true;
            debug!(root = %root.display(), "walk interrupted");
            break;
        }
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                stats.entries_skipped += 1;
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        let ft = entry.file_type();
        if ft.is_dir() {
            stats.dirs_visited += 1;
            if opts.include_dirs {
                on_record(entry.path());
                records.push(entry.into_path());
            }
            continue;
        }

        // 符号链接不跟随；指向普通文件的链接按文件处理
        let is_file = ft.is_file() || (ft.is_symlink() && entry.path().is_file());
        if is_file && accept_file(entry.path(), opts) {
            stats.files_matched += 1;
            on_record(entry.path());
            records.push(entry.into_path());
        }
    }

    (records, stats)
}

/// 是否进入该子目录：深度未超限、非隐藏（可关闭）、未被排除
fn should_descend(entry: &DirEntry, max_depth: usize, opts: &WalkOptions) -> bool {
    if entry.depth() > max_depth {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if opts.skip_hidden_dirs && name.starts_with('.') {
        return false;
    }
    !opts.excludes.matches_name(&name)
}

/// 文件过滤：掩码（包含语义）→ 排除模式 → 内容过滤，全部通过才保留
fn accept_file(path: &Path, opts: &WalkOptions) -> bool {
    if !opts.masks.is_empty() && !opts.masks.matches(path) {
        return false;
    }
    if opts.excludes.matches(path) {
        return false;
    }
    match &opts.contains {
        Some(filter) => filter.file_contains(path),
        None => true,
    }
}
