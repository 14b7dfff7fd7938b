use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pathscout_core::{
    BufferSink, PatternSet, ScanRequest, ScanScheduler, StatusSink, StopReason, WalkOptions,
};

struct Fixture {
    _tmp: tempfile::TempDir,
    root: PathBuf,
    sink: PathBuf,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("tree");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), "alpha").unwrap();
    fs::write(root.join("b.log"), "beta").unwrap();
    fs::write(root.join("sub/c.txt"), "gamma").unwrap();
    let sink = tmp.path().join("_currentdir.txt");
    Fixture { _tmp: tmp, root, sink }
}

fn request(interval: Duration, timeout: Duration) -> ScanRequest {
    ScanRequest { interval, timeout, walk: WalkOptions::default() }
}

fn scheduler(f: &Fixture, req: ScanRequest) -> (ScanScheduler, Arc<BufferSink>) {
    let buf = Arc::new(BufferSink::new());
    let status: Arc<dyn StatusSink> = buf.clone();
    (ScanScheduler::new(&f.root, &f.sink, req, status).unwrap(), buf)
}

fn saved_count(buf: &BufferSink) -> usize {
    buf.lines().iter().filter(|l| l.starts_with("Directory scan saved to")).count()
}

fn wait_for(path: &Path, limit: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if path.exists() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn expired_timeout_runs_exactly_one_cycle_and_cleans_up() {
    let f = fixture();
    let (s, buf) = scheduler(&f, request(Duration::from_secs(60), Duration::ZERO));

    let summary = s.run();
    assert_eq!(summary.reason, StopReason::Timeout);
    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.failed_cycles, 0);
    assert_eq!(saved_count(&buf), 1);
    assert!(!f.sink.exists());
    assert_eq!(buf.lines().last().map(String::as_str), Some("Directory scanning stopped."));
}

#[test]
fn periodic_cycles_until_timeout() {
    let f = fixture();
    let (s, buf) = scheduler(&f, request(Duration::from_millis(100), Duration::from_millis(750)));

    let started = Instant::now();
    let summary = s.run();
    assert_eq!(summary.reason, StopReason::Timeout);
    assert!(summary.cycles >= 3, "only {} cycles", summary.cycles);
    assert!(summary.cycles <= 9, "{} cycles", summary.cycles);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(saved_count(&buf), summary.cycles);
    assert!(!f.sink.exists());
}

#[test]
fn explicit_stop_ends_the_run_and_removes_the_snapshot() {
    let f = fixture();
    let (s, buf) = scheduler(&f, request(Duration::from_millis(50), Duration::from_secs(600)));
    let token = s.cancel_token();
    let sink = f.sink.clone();

    let handle = thread::spawn(move || s.run());
    assert!(wait_for(&sink, Duration::from_secs(5)), "snapshot never appeared");

    let text = fs::read_to_string(&sink).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with(&format!("Current state of {} as of ", f.root.display())));
    let paths: Vec<&str> = lines.collect();
    assert_eq!(paths[0], f.root.display().to_string());
    assert!(paths.contains(&f.root.join("sub/c.txt").display().to_string().as_str()));

    token.cancel();
    let summary = handle.join().unwrap();
    assert_eq!(summary.reason, StopReason::Cancelled);
    assert!(summary.cycles >= 1);
    assert!(!sink.exists());
    assert!(buf.contains("Stop requested. Exiting..."));
}

#[test]
fn banner_follows_parameters_and_first_cycle() {
    let f = fixture();
    let (s, buf) = scheduler(&f, request(Duration::from_millis(50), Duration::from_millis(300)));
    s.run();

    let lines = buf.lines();
    let pos = |prefix: &str| lines.iter().position(|l| l.starts_with(prefix)).unwrap();
    let params = pos("Directory scan parameters:");
    let first_save = pos("Directory scan saved to");
    let banner = pos("Running in background mode (no interactive console)...");
    assert!(params < first_save, "{lines:?}");
    assert!(first_save < banner, "{lines:?}");
}

#[test]
fn expired_timeout_skips_the_banner() {
    let f = fixture();
    let (s, buf) = scheduler(&f, request(Duration::from_secs(60), Duration::ZERO));
    s.run();
    assert!(!buf.contains("Running in background mode"));
}

#[test]
fn snapshot_reflects_masks_in_traversal_order() {
    let f = fixture();
    let req = ScanRequest {
        interval: Duration::from_millis(50),
        timeout: Duration::from_secs(600),
        walk: WalkOptions { masks: PatternSet::parse_list("*.txt"), ..WalkOptions::default() },
    };
    let (s, _buf) = scheduler(&f, req);
    let token = s.cancel_token();
    let sink = f.sink.clone();
    let handle = thread::spawn(move || s.run());
    assert!(wait_for(&sink, Duration::from_secs(5)));

    let text = fs::read_to_string(&sink).unwrap();
    let body: Vec<String> = text.lines().skip(1).map(str::to_string).collect();
    let expected: Vec<String> = [
        f.root.clone(),
        f.root.join("a.txt"),
        f.root.join("sub"),
        f.root.join("sub/c.txt"),
    ]
    .iter()
    .map(|p| p.display().to_string())
    .collect();
    assert_eq!(body, expected);

    token.cancel();
    handle.join().unwrap();
    assert!(!sink.exists());
}

#[test]
fn failing_cycles_are_reported_and_do_not_stop_the_schedule() {
    let f = fixture();
    let buf = Arc::new(BufferSink::new());
    let status: Arc<dyn StatusSink> = buf.clone();
    // 快照目录不存在：每一轮写出都会失败
    let sink = f.root.join("missing-dir/snap.txt");
    let s = ScanScheduler::new(
        &f.root,
        &sink,
        request(Duration::from_millis(50), Duration::from_millis(400)),
        status,
    )
    .unwrap();

    let summary = s.run();
    assert_eq!(summary.reason, StopReason::Timeout);
    assert!(summary.cycles >= 2);
    assert_eq!(summary.failed_cycles, summary.cycles);
    assert!(buf.contains("Error during directory scan"));
    assert!(buf.contains("Directory scanning stopped."));
}

#[test]
fn cancel_before_run_still_performs_cleanup() {
    let f = fixture();
    fs::write(&f.sink, "left over from a previous run").unwrap();
    let (s, buf) = scheduler(&f, request(Duration::from_secs(60), Duration::from_secs(600)));
    s.cancel_token().cancel();

    let summary = s.run();
    assert_eq!(summary.reason, StopReason::Cancelled);
    assert_eq!(saved_count(&buf), 0);
    assert!(!f.sink.exists());
}
