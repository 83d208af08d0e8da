//! Projector configuration stored in `projector.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "projector.toml";

/// Projector configuration (TOML).
///
/// Missing fields default to values suitable for a local backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Base URL of the generation backend (`/template` and `/chat` live under it).
    pub backend_url: String,

    /// Per-request timeout for generation calls, in seconds.
    pub request_timeout_secs: u64,

    /// Directory the project is mounted into for preview.
    pub sandbox_dir: PathBuf,

    /// When set, every round's payload, operations, tree and descriptor are
    /// written under this directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 120,
            sandbox_dir: PathBuf::from("sandbox"),
            log_dir: None,
        }
    }
}

impl ProjectorConfig {
    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if url.is_empty() {
            return Err(anyhow!("backend_url must be non-empty"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(anyhow!("backend_url must start with http:// or https://"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.sandbox_dir.as_os_str().is_empty() {
            return Err(anyhow!("sandbox_dir must be non-empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ProjectorConfig::default()`.
pub fn load_config(path: &Path) -> Result<ProjectorConfig> {
    if !path.exists() {
        let cfg = ProjectorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ProjectorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ProjectorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
