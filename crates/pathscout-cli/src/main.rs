use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pathscout_core::{
    check_path, find_files, find_text, make_dir, open_sink, print_utc_now, Config, ContentFilter,
    DepthLimit, Feature, OutputMode, PathKind, PatternSet, ScanRequest, ScanScheduler, ScoutError,
    StatusSink, WalkOptions, DEFAULT_SINK_NAME,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "pathscout", version, about = "Filesystem helper for automated coding assistants")]
struct Cli {
    /// 丢弃全部输出
    #[arg(long = "null", global = true, conflicts_with = "output_file")]
    null: bool,

    /// 输出重定向到文件（启动时清空）
    #[arg(long, global = true)]
    output_file: Option<PathBuf>,

    /// 配置文件路径，默认位于可执行文件旁
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 周期性扫描目录并维护快照文件，直到超时或输入 q
    Scan(ScanArgs),

    /// 按掩码查找文件，可选按内容过滤
    FindFile {
        /// 逗号分隔的文件名掩码，例如 "*.rs,*.toml"
        #[arg(long)]
        masks: String,
        /// 只保留包含该文本的文件（大小写不敏感）
        #[arg(long)]
        contains: Option<String>,
        /// 子目录层数；0 = 仅当前目录，负数 = 不限
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        depth: i64,
    },

    /// 输出文件中包含指定文本的行（带行号）
    FindText {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        contains: String,
    },

    /// 文件是否存在（输出 exists / missing）
    CheckFile {
        #[arg(long)]
        file: PathBuf,
    },

    /// 目录是否存在（输出 exists / missing）
    CheckDir {
        #[arg(long)]
        dir: PathBuf,
    },

    /// 创建目录（含父目录）
    Mkdir { path: PathBuf },

    /// 输出当前 UTC 时间（yyyy-MM-ddTHH:mm:ssZ）
    Datetime,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// 扫描间隔（秒）
    #[arg(long, default_value_t = 60)]
    interval: u64,

    /// 运行时长上限（分钟）；0 表示只扫描一次
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// 子目录层数；0 = 仅当前目录，负数 = 不限
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    depth: i64,

    /// 逗号分隔的文件名掩码，例如 "*.txt,*.cs"
    #[arg(long)]
    masks: Option<String>,

    /// 逗号分隔的排除模式（作用于文件与子目录）
    #[arg(long)]
    exclude: Option<String>,

    /// 排除模式文件：每行一个，# 开头为注释
    #[arg(long)]
    exclude_file: Option<PathBuf>,

    /// 只列出包含该文本的文件（大小写不敏感）
    #[arg(long)]
    contains: Option<String>,

    /// 扫描根目录，默认当前目录
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// 快照文件，默认 ./_currentdir.txt
    #[arg(long, default_value = DEFAULT_SINK_NAME)]
    sink: PathBuf,
}

fn main() -> ExitCode {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    let mode = if cli.null {
        OutputMode::Suppressed
    } else if let Some(path) = &cli.output_file {
        OutputMode::File(path.clone())
    } else {
        OutputMode::Console
    };
    let status = open_sink(&mode);

    match run(cli, Arc::clone(&status)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            report(status.as_ref(), &e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, status: Arc<dyn StatusSink>) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_init(&config_path)
        .with_context(|| format!("load configuration {}", config_path.display()))?;
    let cwd = std::env::current_dir().context("resolve current directory")?;

    match cli.command {
        Commands::Scan(args) => {
            config.require(Feature::DirectoryScan)?;
            scan(args, status)
        }
        Commands::FindFile { masks, contains, depth } => {
            config.require(Feature::FindFile)?;
            find_files(&cwd, &masks, contains.as_deref(), DepthLimit::from_arg(depth), status.as_ref())?;
            Ok(())
        }
        Commands::FindText { file, contains } => {
            config.require(Feature::FindText)?;
            find_text(&file, &contains, status.as_ref())?;
            Ok(())
        }
        Commands::CheckFile { file } => {
            config.require(Feature::CheckFile)?;
            check_path(&file, PathKind::File, status.as_ref())?;
            Ok(())
        }
        Commands::CheckDir { dir } => {
            config.require(Feature::CheckDir)?;
            check_path(&dir, PathKind::Dir, status.as_ref())?;
            Ok(())
        }
        Commands::Mkdir { path } => {
            config.require(Feature::Mkdir)?;
            make_dir(&path, status.as_ref())?;
            Ok(())
        }
        Commands::Datetime => {
            config.require(Feature::DateTime)?;
            print_utc_now(status.as_ref());
            Ok(())
        }
    }
}

fn scan(args: ScanArgs, status: Arc<dyn StatusSink>) -> Result<()> {
    let mut excludes: Vec<String> = Vec::new();
    if let Some(list) = &args.exclude {
        excludes.extend(PatternSet::parse_list(list).as_strings().iter().cloned());
    }
    if let Some(path) = &args.exclude_file {
        let from_file = PatternSet::from_file(path)
            .with_context(|| format!("read exclude file {}", path.display()))?;
        excludes.extend(from_file.as_strings().iter().cloned());
    }

    let masks = args.masks.as_deref().map(PatternSet::parse_list).unwrap_or_default();
    if args.masks.is_some() && masks.is_empty() {
        return Err(ScoutError::InvalidInput("file mask list is empty".into()).into());
    }

    let request = ScanRequest {
        interval: Duration::from_secs(args.interval),
        timeout: Duration::from_secs(args.timeout.saturating_mul(60)),
        walk: WalkOptions {
            depth: DepthLimit::from_arg(args.depth),
            masks,
            excludes: PatternSet::new(excludes),
            contains: ContentFilter::from_optional(args.contains.as_deref())?,
            include_dirs: true,
            skip_hidden_dirs: true,
        },
    };

    let mut scheduler = ScanScheduler::new(&args.root, &args.sink, request, status)?;
    scheduler.attach_stdin_listener();
    let summary = scheduler.run();
    info!(cycles = summary.cycles, failed = summary.failed_cycles, reason = ?summary.reason, "scan finished");
    Ok(())
}

/// 把错误写成一行面向用户的提示
fn report(status: &dyn StatusSink, e: &anyhow::Error) {
    match e.downcast_ref::<ScoutError>() {
        // 已禁用的提示本身就是完整句子
        Some(ScoutError::Disabled(_)) => status.emit(&e.to_string()),
        _ => status.emit(&format!("Error: {e:#}")),
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 诊断日志写到 stderr，默认 warn，避免与状态输出混在一起
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
