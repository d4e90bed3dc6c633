//! Durable home of the service checkpoint.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use reelsync_logging::sync_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0:?} exists but is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot create state directory {dir:?}: {source}")]
    CreateDir { dir: PathBuf, source: io::Error },
    #[error("cannot read checkpoint {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write checkpoint {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// One checkpoint file inside a state directory.
///
/// Writes stage the new content in a temp file next to the target and rename
/// it into place, so a crash mid-write leaves the previous checkpoint intact.
/// The state directory is created on first write.
#[derive(Debug, Clone)]
pub struct CheckpointFile {
    dir: PathBuf,
    path: PathBuf,
}

impl CheckpointFile {
    pub fn new(dir: impl Into<PathBuf>, filename: &str) -> Self {
        let dir = dir.into();
        let path = dir.join(filename);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current content, or `None` when no checkpoint was written yet.
    pub fn read(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn write(&self, content: &str) -> Result<(), PersistError> {
        self.prepare_dir()?;
        let failed = |source: io::Error| PersistError::Write {
            path: self.path.clone(),
            source,
        };

        let mut staged = NamedTempFile::new_in(&self.dir).map_err(failed)?;
        staged.write_all(content.as_bytes()).map_err(failed)?;
        staged.as_file().sync_all().map_err(failed)?;
        staged
            .persist(&self.path)
            .map_err(|err| failed(err.error))?;
        sync_debug!("persist", "checkpoint written to {:?} ({} bytes)", self.path, content.len());
        Ok(())
    }

    fn prepare_dir(&self) -> Result<(), PersistError> {
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(PersistError::NotADirectory(self.dir.clone()));
        }
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::CreateDir {
            dir: self.dir.clone(),
            source,
        })
    }
}
