//! 文件名模式匹配（极简 glob）
//!
//! 只支持三种形态，均按最后一级文件名、大小写不敏感比较：
//! - `prefix*`：以 prefix 开头
//! - `*suffix`：以 suffix 结尾
//! - 其它：完全相等
//!
//! 不支持 `?`、字符类等完整 glob 语法。
use std::path::Path;

use crate::error::Result;

/// 单条已归一化（小写）的模式
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Prefix(String),
    Suffix(String),
    Exact(String),
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        // 判定顺序与历史行为一致：先看结尾 `*`，再看开头 `*`
        if let Some(prefix) = lower.strip_suffix('*') {
            Pattern::Prefix(prefix.to_string())
        } else if let Some(suffix) = lower.strip_prefix('*') {
            Pattern::Suffix(suffix.to_string())
        } else {
            Pattern::Exact(lower)
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Prefix(p) => name.starts_with(p.as_str()),
            Pattern::Suffix(s) => name.ends_with(s.as_str()),
            Pattern::Exact(e) => name == e,
        }
    }
}

/// 模式集合；空集合对任何名字都返回 false
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    raw: Vec<String>,
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let patterns = raw.iter().map(|p| Pattern::parse(p)).collect();
        Self { raw, patterns }
    }

    /// 解析逗号分隔的模式列表，例如 `"*.txt, *.rs"`
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// 从模式文件加载：每行一个模式，忽略空行与 `#` 注释行
    pub fn from_file(path: &Path) -> Result<Self> {
        let txt = std::fs::read_to_string(path)?;
        Ok(Self::new(
            txt.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// 原始模式文本（用于状态输出）
    pub fn as_strings(&self) -> &[String] {
        &self.raw
    }

    /// 对路径的最后一级名字做匹配；首个命中即返回
    pub fn matches(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().to_lowercase(),
            None => return false,
        };
        self.patterns.iter().any(|p| p.matches(&name))
    }

    /// 与 `matches` 相同，但直接接受名字字符串
    pub fn matches_name(&self, name: &str) -> bool {
        self.matches(Path::new(name))
    }
}
