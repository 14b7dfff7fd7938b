//! 状态输出通道
//!
//! 核心逻辑只通过 `StatusSink` 逐行输出面向用户的文本，
//! 具体写到控制台、文件还是丢弃，由调用方在构造时注入。
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// 逐行状态输出
pub trait StatusSink: Send + Sync {
    fn emit(&self, line: &str);

    fn blank(&self) {
        self.emit("");
    }
}

/// 标准输出
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn emit(&self, line: &str) {
        println!("{line}");
    }
}

/// 丢弃全部输出
#[derive(Debug, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn emit(&self, _line: &str) {}
}

/// 追加写入文件；启动时清空
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    pub fn create(path: &Path) -> io::Result<Self> {
        File::create(path)?;
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self { path: path.to_path_buf(), file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatusSink for FileSink {
    fn emit(&self, line: &str) {
        let mut f = self.file.lock().unwrap_or_else(|e| e.into_inner());
        // 重定向模式下写失败只丢弃这一行
        let _ = writeln!(f, "{line}");
    }
}

/// 内存缓冲（嵌入调用与测试使用）
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl StatusSink for BufferSink {
    fn emit(&self, line: &str) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).push(line.to_string());
    }
}

/// 输出路由方式
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Console,
    File(PathBuf),
    Suppressed,
}

/// 按输出方式构造通道；输出文件无法创建时回退到控制台
pub fn open_sink(mode: &OutputMode) -> Arc<dyn StatusSink> {
    match mode {
        OutputMode::Console => Arc::new(ConsoleSink),
        OutputMode::Suppressed => Arc::new(NullSink),
        OutputMode::File(path) => match FileSink::create(path) {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open output file");
                let console = ConsoleSink;
                console.emit(&format!(
                    "Warning: Could not initialize output file '{}': {e}",
                    path.display()
                ));
                console.emit("Falling back to console output.");
                Arc::new(console)
            }
        },
    }
}
