//! 定时扫描调度
//!
//! 状态机：Idle → Running → Stopping → Stopped。
//! - 进入 Running：计算截止时间，立即同步执行一轮，提示运行模式后按间隔定时触发
//! - 每轮在调度线程上串行执行，两轮之间不会重叠；超时的那一轮之后只会补一次触发
//! - 截止时间到达或收到停止请求后进入 Stopping：释放定时器、删除快照文件
//! - Stopped 为终态，`run` 消费调度器本身，实例不可复用
//!
//! 清理由 `SinkGuard` 的 Drop 保证，包括 panic 展开的路径。
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result as AnyResult;
use chrono::Local;
use crossbeam_channel::{at, select, tick};
use tracing::{debug, info, warn};

use crate::cancel::{CancelToken, Deadline, StopCheck};
use crate::error::{Result, ScoutError};
use crate::interactive;
use crate::options::ScanRequest;
use crate::snapshot;
use crate::status::StatusSink;
use crate::walker;

/// 等待期间轮询取消标志的间隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Timeout,
    Cancelled,
}

/// 一次运行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: StopReason,
    /// 已执行的轮数（含失败的轮）
    pub cycles: usize,
    pub failed_cycles: usize,
}

/// 单轮结果
enum CycleOutcome {
    Saved { items: usize },
    Interrupted,
}

pub struct ScanScheduler {
    root: PathBuf,
    sink: PathBuf,
    request: ScanRequest,
    status: Arc<dyn StatusSink>,
    cancel: CancelToken,
    /// 是否已挂上交互式停止监听
    interactive: bool,
    state: SchedulerState,
}

impl ScanScheduler {
    /// 校验参数并构造调度器；根目录不存在或参数非法时拒绝启动
    pub fn new(
        root: &Path,
        sink: &Path,
        request: ScanRequest,
        status: Arc<dyn StatusSink>,
    ) -> Result<Self> {
        request.validate()?;
        let root = walker::absolutize(root)?;
        if !root.is_dir() {
            return Err(ScoutError::NotFound(root));
        }
        let sink = walker::absolutize(sink)?;
        if sink.is_dir() {
            return Err(ScoutError::InvalidInput(format!(
                "snapshot target is a directory: {}",
                sink.display()
            )));
        }
        Ok(Self {
            root,
            sink,
            request,
            status,
            cancel: CancelToken::new(),
            interactive: false,
            state: SchedulerState::Idle,
        })
    }

    /// 外部停止句柄（交互监听线程、嵌入方使用）
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 终端可交互时挂上 stdin 监听（输入 q 停止），返回是否挂上
    pub fn attach_stdin_listener(&mut self) -> bool {
        self.interactive =
            interactive::spawn_stdin_listener(self.cancel.clone(), Arc::clone(&self.status));
        self.interactive
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn sink(&self) -> &Path {
        &self.sink
    }

    fn transition(&mut self, next: SchedulerState) {
        debug!(from = ?self.state, to = ?next, "scheduler state");
        self.state = next;
    }

    /// 运行直到超时或收到停止请求，返回时快照文件已被删除
    pub fn run(mut self) -> RunSummary {
        self.transition(SchedulerState::Running);
        let deadline = Deadline::after(self.request.timeout);
        let stop = StopCheck::new(deadline, self.cancel.clone());
        let guard = SinkGuard { sink: self.sink.clone(), status: Arc::clone(&self.status) };

        self.announce(&deadline);
        info!(root = %self.root.display(), sink = %self.sink.display(), "directory scan started");

        let mut summary = RunSummary { reason: StopReason::Timeout, cycles: 0, failed_cycles: 0 };

        // 启动后立即执行一轮
        self.cycle(&stop, &mut summary);

        if !self.cancel.is_cancelled() && !deadline.has_passed() {
            self.banner();
            let reason = self.tick_until_stopped(&stop, &mut summary);
            summary.reason = reason;
        } else if self.cancel.is_cancelled() {
            summary.reason = StopReason::Cancelled;
        }

        self.transition(SchedulerState::Stopping);
        match summary.reason {
            StopReason::Timeout => self.status.emit(&format!(
                "Timeout reached after {}. Exiting...",
                describe(self.request.timeout)
            )),
            StopReason::Cancelled => self.status.emit("Stop requested. Exiting..."),
        }
        drop(guard);
        self.transition(SchedulerState::Stopped);
        info!(cycles = summary.cycles, failed = summary.failed_cycles, reason = ?summary.reason, "directory scan stopped");
        summary
    }

    /// 定时循环：定时器、截止时间、周期性轮询三者择一唤醒
    fn tick_until_stopped(&self, stop: &StopCheck, summary: &mut RunSummary) -> StopReason {
        let ticker = tick(self.request.interval);
        let expiry = at(stop.deadline.instant());
        loop {
            if self.cancel.is_cancelled() {
                return StopReason::Cancelled;
            }
            select! {
                recv(ticker) -> _ => {
                    if stop.deadline.has_passed() {
                        return StopReason::Timeout;
                    }
                    self.cycle(stop, summary);
                }
                recv(expiry) -> _ => return StopReason::Timeout,
                default(POLL_INTERVAL) => {}
            }
        }
    }

    /// 执行一轮并记账；单轮失败只报告，不终止调度
    fn cycle(&self, stop: &StopCheck, summary: &mut RunSummary) {
        summary.cycles += 1;
        let started = Instant::now();
        match self.scan_and_save(stop) {
            Ok(CycleOutcome::Saved { items }) => {
                self.status.emit(&format!(
                    "Directory scan saved to {} at {} ({} items, {}ms)",
                    self.sink.display(),
                    Local::now().format("%H:%M:%S"),
                    items,
                    started.elapsed().as_millis()
                ));
            }
            Ok(CycleOutcome::Interrupted) => {
                debug!("cycle interrupted by stop request, snapshot not written");
            }
            Err(e) => {
                summary.failed_cycles += 1;
                warn!(error = %format!("{e:#}"), "scan cycle failed");
                self.status.emit(&format!("Error during directory scan: {e:#}"));
            }
        }
    }

    fn scan_and_save(&self, stop: &StopCheck) -> AnyResult<CycleOutcome> {
        let (records, stats) = walker::walk(&self.root, &self.request.walk, stop);
        debug!(
            dirs = stats.dirs_visited,
            files = stats.files_matched,
            skipped = stats.entries_skipped,
            interrupted = stats.interrupted,
            "walk finished"
        );
        if self.cancel.is_cancelled() {
            return Ok(CycleOutcome::Interrupted);
        }
        let root_desc = self.root.display().to_string();
        snapshot::write(&self.sink, &root_desc, &Local::now(), &records)?;
        Ok(CycleOutcome::Saved { items: records.len() })
    }

    fn banner(&self) {
        if self.interactive {
            self.status.emit("Directory scanning running. Type 'q' and press Enter to quit...");
        } else {
            self.status.emit("Running in background mode (no interactive console)...");
        }
        self.status.blank();
    }

    fn announce(&self, deadline: &Deadline) {
        let s = &self.status;
        let walk = &self.request.walk;
        s.emit("Directory scan parameters:");
        s.emit(&format!("  Root: {}", self.root.display()));
        s.emit(&format!("  Timer interval: {}", describe(self.request.interval)));
        s.emit(&format!(
            "  Timeout: {} (ends at {})",
            describe(self.request.timeout),
            deadline.wall_clock().format("%H:%M:%S")
        ));
        s.emit(&format!("  Depth: {}", walk.depth));
        if !walk.masks.is_empty() {
            s.emit(&format!("  File mask(s): {}", walk.masks.as_strings().join(", ")));
        }
        if !walk.excludes.is_empty() {
            s.emit(&format!("  Exclude pattern(s): {}", walk.excludes.as_strings().join(", ")));
        }
        if let Some(filter) = &walk.contains {
            s.emit(&format!("  Search string: '{}'", filter.needle()));
        }
        s.blank();
    }
}

/// 离开作用域时删除快照文件（正常退出与 panic 展开都会执行）
struct SinkGuard {
    sink: PathBuf,
    status: Arc<dyn StatusSink>,
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        if self.sink.exists() {
            self.status.emit(&format!("Deleting {}...", self.sink.display()));
        }
        match snapshot::remove(&self.sink) {
            Ok(_) => {}
            Err(e) => {
                warn!(sink = %self.sink.display(), error = %e, "cannot delete snapshot");
                self.status.emit(&format!(
                    "Warning: Could not delete {}: {e}",
                    self.sink.display()
                ));
            }
        }
        self.status.emit("Directory scanning stopped.");
    }
}

/// 人类可读的时长：整分钟按分钟显示，否则按秒
fn describe(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} minute(s)", secs / 60)
    } else if d.subsec_millis() == 0 {
        format!("{secs} second(s)")
    } else {
        format!("{}ms", d.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::BufferSink;

    #[test]
    fn durations_are_described_in_the_largest_whole_unit() {
        assert_eq!(describe(Duration::from_secs(600)), "10 minute(s)");
        assert_eq!(describe(Duration::from_secs(90)), "90 second(s)");
        assert_eq!(describe(Duration::from_millis(250)), "250ms");
        assert_eq!(describe(Duration::ZERO), "0 second(s)");
    }

    #[test]
    fn missing_root_refuses_to_start() {
        let tmp = tempfile::tempdir().unwrap();
        let status: Arc<dyn StatusSink> = Arc::new(BufferSink::new());
        let res = ScanScheduler::new(
            &tmp.path().join("nope"),
            &tmp.path().join("snap.txt"),
            ScanRequest::default(),
            status,
        );
        assert!(matches!(res, Err(ScoutError::NotFound(_))));
    }

    #[test]
    fn sink_is_removed_when_the_run_unwinds() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = tmp.path().join("snap.txt");
        std::fs::write(&sink, "Current state of x").unwrap();
        let buf = Arc::new(BufferSink::new());
        let status: Arc<dyn StatusSink> = buf.clone();

        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = SinkGuard { sink: sink.clone(), status };
            panic!("walker blew up");
        }));
        assert!(res.is_err());
        assert!(!sink.exists());
        assert_eq!(buf.lines().last().map(String::as_str), Some("Directory scanning stopped."));
    }

    #[test]
    fn dot_root_is_stored_without_dot_components() {
        let tmp = tempfile::tempdir().unwrap();
        let status: Arc<dyn StatusSink> = Arc::new(BufferSink::new());
        let s = ScanScheduler::new(
            &tmp.path().join("."),
            &tmp.path().join("./snap.txt"),
            ScanRequest::default(),
            status,
        )
        .unwrap();
        assert_eq!(s.root.as_os_str(), tmp.path().as_os_str());
        assert_eq!(s.sink().as_os_str(), tmp.path().join("snap.txt").as_os_str());
    }

    #[test]
    fn new_scheduler_is_idle() {
        let tmp = tempfile::tempdir().unwrap();
        let status: Arc<dyn StatusSink> = Arc::new(BufferSink::new());
        let s = ScanScheduler::new(tmp.path(), &tmp.path().join("snap.txt"), ScanRequest::default(), status)
            .unwrap();
        assert_eq!(s.state(), SchedulerState::Idle);
        assert!(s.sink().is_absolute());
    }
}
