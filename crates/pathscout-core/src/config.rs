//! 功能开关配置（JSON）
//!
//! 缺失的字段默认开启，未知字段忽略；配置文件不存在时写出一份默认配置。
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ScoutError};

pub const CONFIG_FILE_NAME: &str = "pathscout.json";

fn enabled() -> bool {
    true
}

/// 各命令的启用开关
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default = "enabled")]
    pub directory_scan: bool,
    #[serde(default = "enabled")]
    pub mkdir: bool,
    #[serde(default = "enabled")]
    pub find_text: bool,
    #[serde(default = "enabled")]
    pub find_file: bool,
    #[serde(default = "enabled")]
    pub check_file: bool,
    #[serde(default = "enabled")]
    pub check_dir: bool,
    #[serde(default = "enabled")]
    pub date_time: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            directory_scan: true,
            mkdir: true,
            find_text: true,
            find_file: true,
            check_file: true,
            check_dir: true,
            date_time: true,
        }
    }
}

/// 可被开关的功能
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    DirectoryScan,
    Mkdir,
    FindText,
    FindFile,
    CheckFile,
    CheckDir,
    DateTime,
}

impl Feature {
    /// 用于“已禁用”提示的名称
    pub fn label(self) -> &'static str {
        match self {
            Feature::DirectoryScan => "Directory scanning",
            Feature::Mkdir => "Mkdir command",
            Feature::FindText => "FindText command",
            Feature::FindFile => "FindFile command",
            Feature::CheckFile => "CheckFile command",
            Feature::CheckDir => "CheckDir command",
            Feature::DateTime => "DateTime command",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub features: Features,
}

impl Config {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        let f = &self.features;
        match feature {
            Feature::DirectoryScan => f.directory_scan,
            Feature::Mkdir => f.mkdir,
            Feature::FindText => f.find_text,
            Feature::FindFile => f.find_file,
            Feature::CheckFile => f.check_file,
            Feature::CheckDir => f.check_dir,
            Feature::DateTime => f.date_time,
        }
    }

    /// 功能关闭时返回 `ScoutError::Disabled`
    pub fn require(&self, feature: Feature) -> Result<()> {
        if self.is_enabled(feature) {
            Ok(())
        } else {
            Err(ScoutError::Disabled(feature.label()))
        }
    }

    /// 读取配置；文件不存在时尝试写出默认配置（失败只记日志）
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            let txt = std::fs::read_to_string(path)?;
            let cfg: Config = serde_json::from_str(&txt)?;
            debug!(path = %path.display(), "configuration loaded");
            return Ok(cfg);
        }
        let cfg = Config::default();
        if let Err(e) = cfg.save(path) {
            warn!(path = %path.display(), error = %e, "cannot write default configuration");
        }
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// 默认配置位置：可执行文件所在目录，取不到时用当前目录
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.join(CONFIG_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }
}
