/// Single-use execution workspace
///
/// One uniquely named directory per execution, holding exactly one source file.
/// The directory is removed by `release()` or, failing that, on drop.
use crate::config::types::{ExecError, Result};
use std::ffi::OsStr;
use std::fs::{self, DirBuilder};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory name prefix for every workspace
pub const WORKSPACE_PREFIX: &str = "execution_";

pub struct Workspace {
    /// Unique run ID
    run_id: String,
    /// Run-specific directory
    dir: PathBuf,
    /// Source file path, once written
    source_file: Option<PathBuf>,
    released: bool,
}

impl Workspace {
    /// Create a fresh workspace under `root`.
    ///
    /// `root` is created if missing; the run directory itself must not exist.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|e| {
            ExecError::Workspace(format!(
                "failed to create workspace root {}: {}",
                root.display(),
                e
            ))
        })?;

        let run_id = Uuid::new_v4().simple().to_string();
        let dir = root.join(format!("{}{}", WORKSPACE_PREFIX, run_id));

        DirBuilder::new().mode(0o700).create(&dir).map_err(|e| {
            ExecError::Workspace(format!(
                "failed to create workspace directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        log::debug!("Workspace {} created at {}", run_id, dir.display());

        Ok(Self {
            run_id,
            dir,
            source_file: None,
            released: false,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Write the workspace's only source artifact
    pub fn write_source(&mut self, name: &str, content: &str) -> Result<PathBuf> {
        if self.source_file.is_some() {
            return Err(ExecError::Workspace(
                "workspace already holds a source file".to_string(),
            ));
        }
        if name.is_empty() || Path::new(name).file_name() != Some(OsStr::new(name)) {
            return Err(ExecError::Workspace(format!(
                "invalid source file name {:?}",
                name
            )));
        }

        let path = self.dir.join(name);
        fs::write(&path, content).map_err(|e| {
            ExecError::Workspace(format!(
                "failed to write source file {}: {}",
                path.display(),
                e
            ))
        })?;

        self.source_file = Some(path.clone());
        Ok(path)
    }

    /// Remove the workspace and everything in it.
    ///
    /// Never fails and is safe to call more than once; removal errors are logged.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match fs::remove_dir_all(&self.dir) {
            Ok(()) => log::debug!("Workspace {} removed", self.run_id),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove workspace {}: {}",
                self.dir.display(),
                e
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.release();
    }
}
