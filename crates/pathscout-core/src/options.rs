//! 扫描请求与遍历选项（模块）
use std::time::Duration;

use crate::content::ContentFilter;
use crate::error::{Result, ScoutError};
use crate::pattern::PatternSet;

/// “不限深度”时的实际上限，防止环路或病态目录树导致无限递归
pub const MAX_DEPTH_CAP: usize = 100;

/// 默认快照文件名（位于当前目录）
pub const DEFAULT_SINK_NAME: &str = "_currentdir.txt";

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// 深度限制：0 表示只看根目录下的文件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthLimit {
    #[default]
    Unbounded,
    Levels(usize),
}

impl DepthLimit {
    /// 命令行语义：负数表示不限
    pub fn from_arg(depth: i64) -> Self {
        if depth < 0 {
            DepthLimit::Unbounded
        } else {
            DepthLimit::Levels(depth as usize)
        }
    }

    /// 实际生效的最大层数
    pub fn effective(self) -> usize {
        match self {
            DepthLimit::Unbounded => MAX_DEPTH_CAP,
            DepthLimit::Levels(n) => n.min(MAX_DEPTH_CAP),
        }
    }
}

impl std::fmt::Display for DepthLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepthLimit::Unbounded => write!(f, "unlimited (capped at {MAX_DEPTH_CAP} levels)"),
            DepthLimit::Levels(0) => write!(f, "0 (current directory only)"),
            DepthLimit::Levels(n) => write!(f, "{n} level(s)"),
        }
    }
}

/// 遍历过滤选项
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub depth: DepthLimit,
    /// 文件名掩码；非空时文件必须命中其一
    pub masks: PatternSet,
    /// 排除模式；作用于根以下的文件与子目录
    pub excludes: PatternSet,
    /// 内容过滤；文件必须包含该子串
    pub contains: Option<ContentFilter>,
    /// 是否把目录本身写入结果（查找文件时关闭）
    pub include_dirs: bool,
    /// 是否跳过 `.` 开头的子目录（查找文件时不跳过）
    pub skip_hidden_dirs: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            depth: DepthLimit::Unbounded,
            masks: PatternSet::default(),
            excludes: PatternSet::default(),
            contains: None,
            include_dirs: true,
            skip_hidden_dirs: true,
        }
    }
}

/// 一次 scan 调用的完整参数；创建后不再修改
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub interval: Duration,
    /// 0 表示启动即过期：只执行首轮扫描
    pub timeout: Duration,
    pub walk: WalkOptions,
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            walk: WalkOptions::default(),
        }
    }
}

impl ScanRequest {
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ScoutError::InvalidInput("timer interval must be greater than zero".into()));
        }
        Ok(())
    }
}

/// 单次遍历的统计（便于日志输出）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkStats {
    pub dirs_visited: usize,
    pub files_matched: usize,
    pub entries_skipped: usize,
    /// 因截止时间或取消而提前结束
    pub interrupted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_depth_is_unbounded_but_capped() {
        assert_eq!(DepthLimit::from_arg(-1), DepthLimit::Unbounded);
        assert_eq!(DepthLimit::from_arg(-1).effective(), MAX_DEPTH_CAP);
        assert_eq!(DepthLimit::from_arg(0).effective(), 0);
        assert_eq!(DepthLimit::from_arg(3).effective(), 3);
        assert_eq!(DepthLimit::from_arg(10_000).effective(), MAX_DEPTH_CAP);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let req = ScanRequest { interval: Duration::ZERO, ..ScanRequest::default() };
        assert!(matches!(req.validate(), Err(ScoutError::InvalidInput(_))));
        assert!(ScanRequest::default().validate().is_ok());
    }
}
