//! 目录扫描核心库
//!
//! 设计要点：
//! - 周期性遍历目录树，按深度、文件名掩码、排除模式、内容子串过滤，生成路径快照。
//! - 快照整块写入临时文件后原子替换，外部读者只会看到完整的旧快照或新快照。
//! - 运行受截止时间约束，并支持协作式提前取消；任何退出路径都会删除快照文件。
//! - 面向用户的输出统一经由注入的 `StatusSink`，核心不关心输出去向。

mod cancel;
mod config;
mod content;
mod error;
mod interactive;
mod options;
mod pattern;
mod scheduler;
mod snapshot;
mod status;
mod tools;
mod walker;

pub use cancel::{CancelToken, Deadline, StopCheck};
pub use config::{Config, Feature, Features, CONFIG_FILE_NAME};
pub use content::ContentFilter;
pub use error::{Result, ScoutError};
pub use interactive::{listen, spawn_stdin_listener};
pub use options::{
    DepthLimit, ScanRequest, WalkOptions, WalkStats, DEFAULT_INTERVAL, DEFAULT_SINK_NAME,
    DEFAULT_TIMEOUT, MAX_DEPTH_CAP,
};
pub use pattern::PatternSet;
pub use scheduler::{RunSummary, ScanScheduler, SchedulerState, StopReason, POLL_INTERVAL};
pub use snapshot::{render as render_snapshot, write as write_snapshot, HEADER_TIME_FORMAT};
pub use status::{open_sink, BufferSink, ConsoleSink, FileSink, NullSink, OutputMode, StatusSink};
pub use tools::{check_path, find_files, find_text, format_utc, make_dir, print_utc_now, PathKind};
pub use walker::{absolutize, walk};
