//! Configuration loading and parsing.
//!
//! Parses `livepage.toml` (or an override path provided by the binary). Every
//! section and field is optional; absent values take the defaults below.
//! Unknown fields are ignored so older binaries tolerate newer files. A file
//! that fails to parse is reported and replaced by defaults rather than
//! aborting startup.
//!
//! Page sizes are the only values that need sanitizing: entries with a
//! non-finite or non-positive height are dropped, and an empty result falls
//! back to the standard sizes. The raw parsed list is retained next to the
//! effective one.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "livepage.toml";
const APP_DIR: &str = "livepage";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PageSizeEntry {
    pub name: String,
    pub height: f64,
}

impl PageSizeEntry {
    fn new(name: &str, height: f64) -> Self {
        Self {
            name: name.to_string(),
            height,
        }
    }

    fn usable(&self) -> bool {
        self.height.is_finite() && self.height > 0.0
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DebounceConfig {
    #[serde(default = "DebounceConfig::default_quiet_period_ms")]
    pub quiet_period_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: Self::default_quiet_period_ms(),
        }
    }
}

impl DebounceConfig {
    const fn default_quiet_period_ms() -> u64 {
        300
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SaveConfig {
    #[serde(default = "SaveConfig::default_saved_revert_ms")]
    pub saved_revert_ms: u64,
    #[serde(default = "SaveConfig::default_error_revert_ms")]
    pub error_revert_ms: u64,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            saved_revert_ms: Self::default_saved_revert_ms(),
            error_revert_ms: Self::default_error_revert_ms(),
        }
    }
}

impl SaveConfig {
    const fn default_saved_revert_ms() -> u64 {
        1500
    }
    const fn default_error_revert_ms() -> u64 {
        3000
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    #[serde(default = "RuntimeConfig::default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: Self::default_tick_ms(),
        }
    }
}

impl RuntimeConfig {
    const fn default_tick_ms() -> u64 {
        100
    }

    /// Tick interval; zero is raised to 1ms since an interval cannot be empty.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "PaginationConfig::default_sizes")]
    pub sizes: Vec<PageSizeEntry>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            sizes: Self::default_sizes(),
        }
    }
}

impl PaginationConfig {
    pub fn default_sizes() -> Vec<PageSizeEntry> {
        vec![
            PageSizeEntry::new("Letter", 792.0),
            PageSizeEntry::new("A4", 841.89),
            PageSizeEntry::new("Legal", 1008.0),
        ]
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompilerConfig {
    #[serde(default = "CompilerConfig::default_program")]
    pub program: String,
    #[serde(default = "CompilerConfig::default_vector_args")]
    pub vector_args: Vec<String>,
    #[serde(default = "CompilerConfig::default_bytes_args")]
    pub bytes_args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: Self::default_program(),
            vector_args: Self::default_vector_args(),
            bytes_args: Self::default_bytes_args(),
        }
    }
}

impl CompilerConfig {
    fn default_program() -> String {
        "typst".to_string()
    }

    fn args(format: &str) -> Vec<String> {
        ["compile", "--format", format, "-", "-"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn default_vector_args() -> Vec<String> {
        Self::args("svg")
    }

    fn default_bytes_args() -> Vec<String> {
        Self::args("pdf")
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// Project root; `None` means the platform data directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl StoreConfig {
    pub fn root_or_default(&self) -> PathBuf {
        if let Some(root) = &self.root {
            return root.clone();
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR).join("projects"))
            .unwrap_or_else(|| PathBuf::from(".livepage").join("projects"))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "SessionConfig::default_allowed_domains")]
    pub allowed_domains: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            email: None,
            allowed_domains: Self::default_allowed_domains(),
        }
    }
}

impl SessionConfig {
    fn default_allowed_domains() -> Vec<String> {
        vec!["infocusp.com".to_string()]
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

impl OutputConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("preview")
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub debounce: DebounceConfig,
    #[serde(default)]
    pub save: SaveConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>,                  // original file string (optional)
    pub file: ConfigFile,                     // parsed (or default) data
    pub effective_page_sizes: Vec<PageSizeEntry>, // sanitized
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(None, ConfigFile::default())
    }
}

/// Best-effort config path: `./livepage.toml`, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join(APP_DIR).join(CONFIG_FILE);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config::from_file(Some(content), file))
        }
        Err(err) => {
            warn!(
                target: "config",
                path = %path.display(),
                error = %err.message(),
                "config_parse_failed_using_defaults"
            );
            Ok(Config::default())
        }
    }
}

impl Config {
    fn from_file(raw: Option<String>, file: ConfigFile) -> Self {
        let mut cfg = Self {
            raw,
            file,
            effective_page_sizes: Vec::new(),
        };
        cfg.sanitize_page_sizes();
        cfg
    }

    /// Recompute `effective_page_sizes` from the parsed list. Returns the
    /// number of entries dropped.
    pub fn sanitize_page_sizes(&mut self) -> usize {
        let raw = &self.file.pagination.sizes;
        let usable: Vec<PageSizeEntry> = raw.iter().filter(|s| s.usable()).cloned().collect();
        let dropped = raw.len() - usable.len();
        if dropped > 0 {
            info!(target: "config", dropped, kept = usable.len(), "page_sizes_dropped");
        }
        if usable.is_empty() {
            info!(
                target: "config",
                configured = raw.len(),
                "page_sizes_restored_to_defaults"
            );
            self.effective_page_sizes = PaginationConfig::default_sizes();
        } else {
            self.effective_page_sizes = usable;
        }
        dropped
    }
}
