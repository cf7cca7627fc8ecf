//! Image blobs on local disk, one JPEG file per capture.
//!
//! Files are named after the capture time at one-second resolution
//! (`YYYYMMDDHHMMSS.jpg`). Files are created exclusively, so a second capture
//! within the same second gets `YYYYMMDDHHMMSS-1.jpg` instead of replacing
//! the first one.
use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
};
use tracing::{debug, warn};

const EXTENSION: &str = "jpg";

/// Gives up after this many same-second captures.
const MAX_SUFFIX: u32 = 999;

#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Write `bytes` verbatim under a name derived from `at` and return that
    /// name. No content validation happens here.
    pub async fn write_capture(&self, at: DateTime<Utc>, bytes: &[u8]) -> io::Result<String> {
        self.ensure_dir().await?;

        let stem = at.format("%Y%m%d%H%M%S").to_string();
        for n in 0..=MAX_SUFFIX {
            let filename = if n == 0 {
                format!("{stem}.{EXTENSION}")
            } else {
                format!("{stem}-{n}.{EXTENSION}")
            };
            let path = self.dir.join(&filename);

            let file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };

            fill_or_discard(file, &path, bytes).await?;
            debug!(path = %path.display(), bytes = bytes.len(), "blob_store: saved");
            return Ok(filename);
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free filename left for capture second {stem}"),
        ))
    }

    /// Delete every `.jpg` in the directory. A missing directory counts as
    /// already clear.
    pub async fn clear(&self) -> io::Result<usize> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "blob_store: failed to delete");
                    return Err(e);
                }
            }
        }
        Ok(removed)
    }
}

/// Write all of `bytes` into the freshly created file at `path`. On failure
/// the partial file is removed so its name is free for the next capture.
async fn fill_or_discard<W>(mut file: W, path: &Path, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(rm) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %rm, "blob_store: could not remove partial file");
        }
        return Err(e);
    }
    Ok(())
}
