//! 交互式停止监听
//!
//! 仅当标准输入是终端时启动后台线程，读到 `q`/`Q` 行即置位取消标志。
//! 无终端（后台运行）时不启动，调度器只依赖截止时间结束。
use std::io::{self, BufRead, IsTerminal};
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::status::StatusSink;

/// 读取行输入直到出现停止指令或输入结束；返回是否触发了停止
pub fn listen<R: BufRead>(reader: R, token: &CancelToken, status: &dyn StatusSink) -> bool {
    for line in reader.lines() {
        let Ok(line) = line else { break };
        if token.is_cancelled() {
            return false;
        }
        if line.trim().eq_ignore_ascii_case("q") {
            status.emit("User requested shutdown...");
            token.cancel();
            return true;
        }
    }
    false
}

/// 标准输入为终端时启动监听线程；返回是否已启动
pub fn spawn_stdin_listener(token: CancelToken, status: Arc<dyn StatusSink>) -> bool {
    if !io::stdin().is_terminal() {
        debug!("stdin is not a terminal, interactive stop disabled");
        return false;
    }
    let spawned = thread::Builder::new()
        .name("stop-listener".into())
        .spawn(move || {
            listen(io::stdin().lock(), &token, status.as_ref());
        });
    spawned.is_ok()
}
