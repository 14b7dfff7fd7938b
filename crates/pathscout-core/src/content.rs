//! 按行流式的内容检索
//!
//! 逐行读取、命中即停，不把整个文件读入内存。
//! 任何打开/读取错误、以及在命中之前遇到的非 UTF-8 行，都按“不匹配”处理。
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use regex::{Regex, RegexBuilder};
use tracing::trace;

use crate::error::{Result, ScoutError};

/// 大小写不敏感的子串过滤器
#[derive(Debug, Clone)]
pub struct ContentFilter {
    needle: String,
    re: Regex,
}

impl ContentFilter {
    /// 构建过滤器；needle 按字面量处理（正则元字符会被转义），全空白视为未指定
    pub fn new(needle: &str) -> Result<Self> {
        if needle.trim().is_empty() {
            return Err(ScoutError::InvalidInput("search string is empty".into()));
        }
        let re = RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()
            .map_err(|e| ScoutError::InvalidInput(format!("search string: {e}")))?;
        Ok(Self { needle: needle.to_string(), re })
    }

    /// 空白字符串视为“未设置过滤器”
    pub fn from_optional(needle: Option<&str>) -> Result<Option<Self>> {
        match needle {
            Some(s) if !s.trim().is_empty() => Self::new(s).map(Some),
            _ => Ok(None),
        }
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.re.is_match(line)
    }

    /// 文件是否包含 needle；失败一律返回 false
    pub fn file_contains(&self, path: &Path) -> bool {
        match File::open(path) {
            Ok(f) => self.reader_contains(BufReader::new(f)),
            Err(e) => {
                trace!(path = %path.display(), error = %e, "cannot open file for content check");
                false
            }
        }
    }

    /// 在任意 `BufRead` 上检索，读到第一处命中的那一行即返回
    pub fn reader_contains<R: BufRead>(&self, reader: R) -> bool {
        for line in reader.lines() {
            match line {
                Ok(l) if self.is_match(&l) => return true,
                Ok(_) => {}
                Err(_) => return false,
            }
        }
        false
    }

    /// 逐行回调所有命中行（行号从 1 开始），返回命中总数。
    /// 非 UTF-8 内容按有损方式解码，读错误向上传播。
    pub fn for_each_match<R, F>(&self, mut reader: R, mut on_match: F) -> io::Result<usize>
    where
        R: BufRead,
        F: FnMut(usize, &str),
    {
        let mut buf = Vec::new();
        let mut line_no = 0usize;
        let mut hits = 0usize;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if self.is_match(line) {
                hits += 1;
                on_match(line_no, line);
            }
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    /// 读到这里就说明越过了命中行
    struct Poisoned;

    impl Read for Poisoned {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "read past the matching line"))
        }
    }

    #[test]
    fn case_insensitive_substring() {
        let f = ContentFilter::new("error").unwrap();
        assert!(f.reader_contains(Cursor::new("ok\nan ERROR occurred\n")));
        assert!(!f.reader_contains(Cursor::new("ok\nall good\n")));
    }

    #[test]
    fn needle_is_literal_not_regex() {
        let f = ContentFilter::new("a.b(").unwrap();
        assert!(f.is_match("x A.B( y"));
        assert!(!f.is_match("axb("));
    }

    #[test]
    fn stops_reading_at_first_matching_line() {
        // 第 3 行命中；之后的内容一旦被读取就会报错
        let head = "line one\nline two\nan ERROR here\n";
        let reader = BufReader::new(Cursor::new(head).chain(Poisoned));
        let f = ContentFilter::new("ERROR").unwrap();
        assert!(f.reader_contains(reader));
    }

    #[test]
    fn match_on_line_three_of_ten_thousand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.log");
        let mut body = String::from("a\nb\nsome ERROR\n");
        for i in 3..10_000 {
            body.push_str(&format!("filler {i}\n"));
        }
        std::fs::write(&path, body).unwrap();
        assert!(ContentFilter::new("error").unwrap().file_contains(&path));
    }

    #[test]
    fn missing_file_is_not_a_match() {
        let f = ContentFilter::new("x").unwrap();
        assert!(!f.file_contains(Path::new("/definitely/not/here.txt")));
    }

    #[test]
    fn undecodable_content_is_not_a_match() {
        let f = ContentFilter::new("needle").unwrap();
        let bytes: &[u8] = b"\xff\xfe\x00binary\nneedle\n";
        assert!(!f.reader_contains(Cursor::new(bytes)));
    }

    #[test]
    fn blank_needle_means_no_filter() {
        assert!(ContentFilter::from_optional(None).unwrap().is_none());
        assert!(ContentFilter::from_optional(Some("  ")).unwrap().is_none());
        assert!(ContentFilter::from_optional(Some("x")).unwrap().is_some());
        assert!(ContentFilter::new("").is_err());
        assert!(matches!(ContentFilter::new(" \t "), Err(ScoutError::InvalidInput(_))));
        // 两侧带空白的非空 needle 原样保留
        assert_eq!(ContentFilter::new(" x ").unwrap().needle(), " x ");
    }

    #[test]
    fn reports_every_matching_line_with_numbers() {
        let f = ContentFilter::new("todo").unwrap();
        let mut seen = Vec::new();
        let hits = f
            .for_each_match(Cursor::new("TODO one\nnothing\r\nlast todo"), |n, l| {
                seen.push((n, l.to_string()))
            })
            .unwrap();
        assert_eq!(hits, 2);
        assert_eq!(seen, vec![(1, "TODO one".to_string()), (3, "last todo".to_string())]);
    }
}
