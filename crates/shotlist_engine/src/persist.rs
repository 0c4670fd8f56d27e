use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

const PART_SUFFIX: &str = ".part";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path:?} is unusable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl PersistError {
    pub(crate) fn output_dir(path: &Path, reason: impl ToString) -> Self {
        Self::OutputDir {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Create `dir` if missing and check that it accepts new files.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    fs::create_dir_all(dir).map_err(|e| PersistError::output_dir(dir, e))?;
    if !dir.is_dir() {
        return Err(PersistError::output_dir(dir, "not a directory"));
    }
    part_file(dir).map_err(|e| PersistError::output_dir(dir, e))?;
    Ok(())
}

/// Hidden `.part` sibling that is renamed into place once complete.
fn part_file(dir: &Path) -> io::Result<NamedTempFile> {
    Builder::new()
        .prefix(".shotlist-")
        .suffix(PART_SUFFIX)
        .tempfile_in(dir)
}

/// Writes whole files into one directory, so readers see either the old
/// content or the complete new content.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: impl AsRef<[u8]>) -> Result<PathBuf, PersistError> {
        if !self.dir.is_dir() {
            ensure_output_dir(&self.dir)?;
        }

        let mut part = part_file(&self.dir)?;
        part.write_all(content.as_ref())?;
        part.as_file().sync_all()?;

        let target = self.dir.join(filename);
        // Windows refuses to rename over an existing file.
        if cfg!(windows) && target.is_file() {
            fs::remove_file(&target)?;
        }
        part.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_reports_its_directory() {
        let writer = AtomicFileWriter::new(PathBuf::from("shots"));
        assert_eq!(writer.dir(), Path::new("shots"));
    }

    #[test]
    fn output_dir_error_names_the_path() {
        let err = PersistError::output_dir(Path::new("/nope"), "denied");
        assert_eq!(
            err.to_string(),
            "output directory \"/nope\" is unusable: denied"
        );
    }
}
