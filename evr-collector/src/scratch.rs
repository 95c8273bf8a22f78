use std::io::{self, Write};
use std::path::{Path, PathBuf};

use jiff::Zoned;
use rand::Rng;

const MAX_NAME_ATTEMPTS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ScratchError {
    #[error("failed to create scratch file {path:?}: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("failed to write scratch file {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Directory of uploaded bodies waiting to be ingested.
#[derive(Debug, Clone)]
pub struct ScratchStore {
    dir: PathBuf,
}

impl ScratchStore {
    /// Creates `dir` (and its parents) if missing.
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `body` verbatim to a fresh `<yyyymmddhhmmss>-<nnn>.txt` file.
    ///
    /// Names are never reused: a clash with an existing file draws a new
    /// suffix instead of overwriting it.
    pub fn write(&self, body: &[u8]) -> Result<PathBuf, ScratchError> {
        let mut attempt = 0;
        let (path, mut file) = loop {
            let name = scratch_file_name(&Zoned::now(), rand::rng().random_range(0..1000));
            let path = self.dir.join(name);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    attempt += 1;
                }
                Err(source) => return Err(ScratchError::Create { path, source }),
            }
        };

        if let Err(source) = file.write_all(body).and_then(|()| file.flush()) {
            drop(file);
            let _ = std::fs::remove_file(&path);
            return Err(ScratchError::Write { path, source });
        }

        Ok(path)
    }

    /// Lists upload files already in the directory, oldest name first.
    ///
    /// Anything here at startup was accepted by an earlier run but never
    /// ingested.
    pub fn pending(&self) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

pub fn scratch_file_name(now: &Zoned, suffix: u16) -> String {
    format!("{}-{:03}.txt", now.strftime("%Y%m%d%H%M%S"), suffix % 1000)
}
