//! Sandbox mount capability.
//!
//! A [`Sandbox`] receives the complete mount descriptor after every tree
//! change. [`DirectorySandbox`] materializes it under a directory on disk so any
//! static server or dev server can preview the project.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::core::mount::{MountDescriptor, MountEntry};

/// Execution environment that can mount a project descriptor.
pub trait Sandbox {
    /// Mount `descriptor`. Each call carries the full current tree.
    fn mount(&self, descriptor: &MountDescriptor) -> Result<()>;
}

/// Mounting the current tree failed.
#[derive(Debug)]
pub struct MountError {
    pub source: anyhow::Error,
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sandbox mount failed: {:#}", self.source)
    }
}

impl std::error::Error for MountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

/// Sandbox backed by a directory on the local filesystem.
///
/// Mounting writes every file of the descriptor and creates every directory.
/// Files that exist on disk but not in the descriptor are left alone.
#[derive(Debug, Clone)]
pub struct DirectorySandbox {
    root: PathBuf,
}

impl DirectorySandbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Sandbox for DirectorySandbox {
    #[instrument(skip_all, fields(root = %self.root.display(), entries = descriptor.len()))]
    fn mount(&self, descriptor: &MountDescriptor) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create sandbox root {}", self.root.display()))?;
        let written = write_level(&self.root, descriptor)?;
        debug!(files = written, "mounted descriptor");
        Ok(())
    }
}

fn write_level(dir: &Path, descriptor: &MountDescriptor) -> Result<usize> {
    let mut written = 0;
    for (name, entry) in descriptor.iter() {
        let target = dir.join(checked_name(name)?);
        match entry {
            MountEntry::File { contents } => {
                fs::write(&target, contents)
                    .with_context(|| format!("write {}", target.display()))?;
                written += 1;
            }
            MountEntry::Directory(children) => {
                fs::create_dir_all(&target)
                    .with_context(|| format!("create directory {}", target.display()))?;
                written += write_level(&target, children)?;
            }
        }
    }
    Ok(written)
}

/// Reject entry names that would escape the directory they are mounted into.
fn checked_name(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(name),
        _ => Err(anyhow!("refusing to mount entry named '{name}'")),
    }
}
