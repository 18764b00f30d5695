//! Configuration for examdates paths and defaults.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (EXAMDATES_HOME, EXAMDATES_STORE, EXAMDATES_CATALOG)
//! 2. Config file (.examdates/config.yaml)
//! 3. Defaults (~/.examdates)
//!
//! Config file discovery:
//! - Searches current directory and parents for .examdates/config.yaml
//! - Paths in config file are relative to the .examdates/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::notifications::DEFAULT_CAPACITY;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Store document file name inside the home directory
pub const STORE_FILE: &str = "exam_dates.json";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory
    pub home: Option<String>,
    /// Store document
    pub store: Option<String>,
    /// Course catalog JSON (built-in catalog when absent)
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    pub total_students: Option<u32>,
    pub notification_capacity: Option<usize>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to examdates home
    pub home: PathBuf,
    /// Path to the store document
    pub store: PathBuf,
    /// Optional course catalog file
    pub catalog: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Workflow defaults
    pub settings: Settings,
}

/// Tunables used by the exam date service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Cohort size for courses missing from the catalog
    pub default_total_students: u32,
    /// Notifications retained in memory
    pub notification_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_total_students: 120,
            notification_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".examdates").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a parsed config file with environment overrides
fn resolve(
    config: Option<(&Path, ConfigFile)>,
    default_home: PathBuf,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let (config_file, file) = match config {
        Some((path, file)) => (Some(path.to_path_buf()), Some(file)),
        None => (None, None),
    };

    // Relative paths resolve against .examdates/
    let config_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);

    let from_file = |select: fn(&PathsConfig) -> Option<&String>| -> Option<PathBuf> {
        let file = file.as_ref()?;
        let dir = config_dir.as_deref().unwrap_or(Path::new("."));
        select(&file.paths).map(|p| resolve_path(dir, p))
    };

    let home = env("EXAMDATES_HOME")
        .map(PathBuf::from)
        .or_else(|| from_file(|p| p.home.as_ref()))
        .unwrap_or(default_home);

    let store = env("EXAMDATES_STORE")
        .map(PathBuf::from)
        .or_else(|| from_file(|p| p.store.as_ref()))
        .unwrap_or_else(|| home.join(STORE_FILE));

    let catalog = env("EXAMDATES_CATALOG")
        .map(PathBuf::from)
        .or_else(|| from_file(|p| p.catalog.as_ref()));

    let defaults = file.as_ref().and_then(|f| f.defaults.as_ref());
    let fallback = Settings::default();
    let settings = Settings {
        default_total_students: defaults
            .and_then(|d| d.total_students)
            .unwrap_or(fallback.default_total_students),
        notification_capacity: defaults
            .and_then(|d| d.notification_capacity)
            .unwrap_or(fallback.notification_capacity),
    };

    ResolvedConfig {
        home,
        store,
        catalog,
        config_file,
        settings,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".examdates");

    let env = |key: &str| std::env::var(key).ok();

    match find_config_file() {
        Some(path) => {
            let file = load_config_file(&path)?;
            Ok(resolve(Some((path.as_path(), file)), default_home, env))
        }
        None => Ok(resolve(None, default_home, env)),
    }
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
