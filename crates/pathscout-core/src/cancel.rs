//! 取消标志与截止时间
//!
//! 两者是调度线程、遍历过程与交互监听线程之间唯一共享的状态：
//! - `CancelToken`：只会被置位一次，置位后永不清除
//! - `Deadline`：启动时计算一次，之后只读
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

const FAR_FUTURE: Duration = Duration::from_secs(u32::MAX as u64);

/// 协作式取消标志（可跨线程克隆）
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求停止；返回 true 表示本次调用完成了置位
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// 绝对截止时间。比较使用单调时钟，展示使用本地墙钟。
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    wall: DateTime<Local>,
}

impl Deadline {
    /// 以当前时刻为起点计算截止时间
    pub fn after(timeout: Duration) -> Self {
        // 超长超时截断到约 136 年，避免时间运算溢出
        let timeout = timeout.min(FAR_FUTURE);
        let wall = Local::now()
            + chrono::Duration::from_std(timeout).unwrap_or_else(|_| chrono::Duration::zero());
        Self { at: Instant::now() + timeout, wall }
    }

    /// 实际上不会触达的截止时间（用于一次性查找类命令）
    pub fn never() -> Self {
        Self::after(FAR_FUTURE)
    }

    #[inline]
    pub fn has_passed(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// 本地时间，供状态输出使用
    pub fn wall_clock(&self) -> DateTime<Local> {
        self.wall
    }
}

/// 遍历过程中需要观察的停止条件
#[derive(Debug, Clone)]
pub struct StopCheck {
    pub deadline: Deadline,
    pub cancel: CancelToken,
}

impl StopCheck {
    pub fn new(deadline: Deadline, cancel: CancelToken) -> Self {
        Self { deadline, cancel }
    }

    /// 不会主动停止的检查器
    pub fn unbounded() -> Self {
        Self::new(Deadline::never(), CancelToken::new())
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.has_passed()
    }
}
