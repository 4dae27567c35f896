//! Upload staging
//!
//! Container formats are probed and decoded by ffmpeg, which needs a seekable file.
//! Uploads of those kinds are streamed to a temp file owned by a [`StagedFile`]; the
//! file is removed when the owner is dropped, whether the conversion finished, failed,
//! panicked, or was cancelled.

use std::convert::Infallible;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use futures::{future, stream, Stream, StreamExt};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use toolkit_core::StickerError;

/// Largest piece written to disk at once.
pub const STAGING_CHUNK_SIZE: usize = 1024 * 1024;

const STAGED_FILE_PREFIX: &str = "sticker-";

/// Body of an upload that is already fully in memory.
pub type BytesBody = stream::Once<future::Ready<Result<Bytes, Infallible>>>;

/// One uploaded file: a byte stream read at most once, plus what the client declared about it.
pub struct MediaUpload<S> {
    pub body: S,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl<S> MediaUpload<S> {
    pub fn new(body: S, content_type: Option<String>, filename: Option<String>) -> Self {
        Self {
            body,
            content_type,
            filename,
        }
    }

    /// Name used to derive the download filename: the filename, else the content type.
    pub fn original_name(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.content_type.as_deref().filter(|s| !s.is_empty()))
    }
}

impl MediaUpload<BytesBody> {
    pub fn from_bytes(
        data: impl Into<Bytes>,
        content_type: Option<&str>,
        filename: Option<&str>,
    ) -> Self {
        Self::new(
            stream::once(future::ready(Ok(data.into()))),
            content_type.map(str::to_string),
            filename.map(str::to_string),
        )
    }
}

/// Sole owner of one temp file on disk. Dropping it deletes the file.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone)]
pub struct UploadStager {
    dir: PathBuf,
}

impl UploadStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Stream `body` into a fresh uniquely named temp file ending in `suffix`.
    ///
    /// An upload that wrote zero bytes is rejected with `EmptyUpload` and its file is
    /// removed before returning.
    #[tracing::instrument(skip(self, body))]
    pub async fn stage<S, E>(&self, body: S, suffix: &str) -> Result<StagedFile, StickerError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let named = tempfile::Builder::new()
            .prefix(STAGED_FILE_PREFIX)
            .suffix(suffix)
            .tempfile_in(&self.dir)?;
        let mut file = tokio::fs::File::from_std(named.reopen()?);

        futures::pin_mut!(body);
        let mut size: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| StickerError::InvalidUpload(e.to_string()))?;
            for piece in chunk.chunks(STAGING_CHUNK_SIZE) {
                file.write_all(piece).await?;
                size += piece.len() as u64;
            }
        }
        file.flush().await?;
        drop(file);

        if size == 0 {
            return Err(StickerError::empty_file());
        }

        tracing::debug!(path = %named.path().display(), size_bytes = size, "Upload staged");

        Ok(StagedFile { file: named, size })
    }
}

/// Buffer a whole upload body in memory.
pub async fn read_to_bytes<S, E>(body: S) -> Result<Bytes, StickerError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    futures::pin_mut!(body);
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| StickerError::InvalidUpload(e.to_string()))?;
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}
