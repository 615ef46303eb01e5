use std::path::{Path, PathBuf};

use futures_util::{Stream, StreamExt};
use tokio::{fs, io::AsyncWriteExt};

use crate::error::{Result, TtsError};

/// Base name of the audio artifact; the provider's extension is appended
const ARTIFACT_STEM: &str = "audio";

/// Location of the audio artifact and the file operations on it
///
/// Each synthesis overwrites `<dir>/audio<ext>`; no history is kept.
#[derive(Debug, Clone)]
pub struct AudioOutput {
    dir: PathBuf,
}

impl AudioOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact path for an extension such as `.mp3`
    pub fn path_for(&self, extension: &str) -> PathBuf {
        self.dir.join(format!("{ARTIFACT_STEM}{extension}"))
    }

    /// Append every non-empty chunk to `path` in order
    ///
    /// If the stream or a write fails, the file is removed before the error
    /// is returned. Returns the number of bytes written.
    pub async fn write_stream<S, B>(&self, path: &Path, chunks: S) -> Result<u64>
    where
        S: Stream<Item = Result<B>>,
        B: AsRef<[u8]>,
    {
        let result = write_chunks(path, chunks).await;

        if result.is_err() {
            self.cleanup(path).await;
        }

        result
    }

    /// Write a complete buffer to `path`, removing the file on failure
    pub async fn write_all(&self, path: &Path, audio: &[u8]) -> Result<()> {
        let result = fs::write(path, audio).await.map_err(|e| TtsError::output(path, e));

        if result.is_err() {
            self.cleanup(path).await;
        }

        result
    }

    /// Create or truncate `path` to an empty file
    pub async fn touch(&self, path: &Path) -> Result<()> {
        fs::File::create(path).await.map_err(|e| TtsError::output(path, e))?;
        Ok(())
    }

    /// Remove `path`, ignoring a file that is already gone
    pub async fn cleanup(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "removed audio output after failure"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove audio output"),
        }
    }
}

async fn write_chunks<S, B>(path: &Path, chunks: S) -> Result<u64>
where
    S: Stream<Item = Result<B>>,
    B: AsRef<[u8]>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut file = fs::File::create(path).await.map_err(|e| TtsError::output(path, e))?;
    let mut written = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        let bytes = chunk.as_ref();

        if bytes.is_empty() {
            continue;
        }

        file.write_all(bytes).await.map_err(|e| TtsError::output(path, e))?;
        written += bytes.len() as u64;
    }

    file.flush().await.map_err(|e| TtsError::output(path, e))?;

    Ok(written)
}
