//! Listing and sequential download of Drive files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Method;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::client::{MediaSource, ServiceCall};
use crate::error::{ReportError, Result};
use crate::ids::{is_native_document, validate_id};
use crate::models::{FileDescriptor, FileListResponse};

const FILE_FIELDS: &str = "id, name, mimeType, size";

/// List every file visible to the credentials.
pub async fn list_files<S: ServiceCall>(service: &S) -> Result<Vec<FileDescriptor>> {
    let fields = format!("nextPageToken, files({})", FILE_FIELDS);
    let mut all_files = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut params = vec![("fields", fields.as_str()), ("pageSize", "100")];
        if let Some(ref token) = page_token {
            params.push(("pageToken", token.as_str()));
        }

        let value = service.call(Method::GET, "files", &params).await?;
        let list_response: FileListResponse = serde_json::from_value(value)?;
        all_files.extend(list_response.files);

        match list_response.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    info!(count = all_files.len(), "listed files");
    Ok(all_files)
}

/// Get file metadata by ID.
pub async fn get_file<S: ServiceCall>(service: &S, file_id: &str) -> Result<FileDescriptor> {
    let path = format!("files/{}", validate_id("file", file_id)?);
    let value = service
        .call(Method::GET, &path, &[("fields", FILE_FIELDS)])
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// Receives download progress.
pub trait ProgressSink {
    fn file_started(&mut self, _file: &FileDescriptor) {}

    /// Called with a non-decreasing percentage in `0..=100`.
    fn progress(&mut self, file: &FileDescriptor, percent: u8);

    fn file_finished(&mut self, _file: &FileDescriptor, _status: &FileStatus) {}
}

/// A sink that ignores every event.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _file: &FileDescriptor, _percent: u8) {}
}

/// What happened to one file of a batch.
#[derive(Debug)]
pub enum FileStatus {
    Downloaded { path: PathBuf, bytes: u64 },
    /// Editor-native document without binary content.
    Skipped,
    Failed(ReportError),
}

#[derive(Debug)]
pub struct FileOutcome {
    pub file: FileDescriptor,
    pub status: FileStatus,
}

/// Per-file results of a download batch, in input order.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<FileOutcome>,
}

impl DownloadReport {
    pub fn downloaded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Downloaded { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Skipped))
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

/// Tracks a completion percentage that never goes backwards.
#[derive(Debug)]
pub struct ProgressTracker {
    total: Option<u64>,
    written: u64,
    last: u8,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total,
            written: 0,
            last: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Record `bytes` more; returns the new percentage when it increased.
    pub fn advance(&mut self, bytes: usize) -> Option<u8> {
        self.written += bytes as u64;
        let total = self.total?;
        let percent = if total == 0 {
            100
        } else {
            (self.written.saturating_mul(100) / total).min(100) as u8
        };
        self.bump(percent)
    }

    /// Mark the transfer complete; returns 100 unless already reported.
    pub fn finish(&mut self) -> Option<u8> {
        self.bump(100)
    }

    fn bump(&mut self, percent: u8) -> Option<u8> {
        if percent > self.last {
            self.last = percent;
            Some(percent)
        } else {
            None
        }
    }
}

/// Final path component of a remote file name.
pub fn local_file_name(name: &str) -> Result<&str> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            ReportError::QueryConstruction(format!("cannot store a file named {:?}", name))
        })
}

/// Local names handed out within one batch.
///
/// Drive allows several files with the same name; later ones get ` (n)` before the
/// extension so no two files of a batch share a path.
#[derive(Debug, Default)]
pub struct LocalNames {
    taken: HashSet<String>,
}

impl LocalNames {
    /// Reserve a unique local name for the remote `name`.
    pub fn reserve(&mut self, name: &str) -> Result<String> {
        let base = local_file_name(name)?;
        if self.taken.insert(base.to_string()) {
            return Ok(base.to_string());
        }

        let path = Path::new(base);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(base);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let mut n = 1;
        loop {
            let candidate = format!("{} ({}){}", stem, n, extension);
            if self.taken.insert(candidate.clone()) {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

/// Download `files` one after another into `destination`.
///
/// Editor-native documents are skipped. A failing file is recorded and the batch continues.
pub async fn download_all<M, P>(
    source: &M,
    files: &[FileDescriptor],
    destination: &Path,
    progress: &mut P,
) -> DownloadReport
where
    M: MediaSource,
    P: ProgressSink,
{
    let mut report = DownloadReport::default();
    let mut names = LocalNames::default();

    for file in files {
        let status = if is_native_document(&file.mime_type) {
            debug!(name = %file.name, mime_type = %file.mime_type, "skipping native document");
            FileStatus::Skipped
        } else {
            progress.file_started(file);
            let result = match names.reserve(&file.name) {
                Ok(local_name) => {
                    download_one(source, file, &destination.join(local_name), progress).await
                }
                Err(e) => Err(e),
            };
            match result {
                Ok((path, bytes)) => {
                    info!(name = %file.name, path = %path.display(), bytes, "downloaded file");
                    FileStatus::Downloaded { path, bytes }
                }
                Err(e) => {
                    warn!(name = %file.name, error = %e, "download failed");
                    FileStatus::Failed(e)
                }
            }
        };

        progress.file_finished(file, &status);
        report.outcomes.push(FileOutcome {
            file: file.clone(),
            status,
        });
    }

    report
}

async fn download_one<M, P>(
    source: &M,
    file: &FileDescriptor,
    target: &Path,
    progress: &mut P,
) -> Result<(PathBuf, u64)>
where
    M: MediaSource,
    P: ProgressSink,
{
    let path = format!("files/{}", validate_id("file", &file.id)?);
    let media = source.open_media(&path, &[("alt", "media")]).await?;

    let mut tracker = ProgressTracker::new(media.total.or(file.size));
    progress.progress(file, 0);

    let mut out = File::create(target).await?;
    if let Err(e) = write_stream(&mut out, media.chunks, file, &mut tracker, progress).await {
        drop(out);
        return Err(discard_partial(target, file, tracker.written(), e).await);
    }

    if let Some(percent) = tracker.finish() {
        progress.progress(file, percent);
    }
    Ok((target.to_path_buf(), tracker.written()))
}

/// Copy every chunk to `out` and flush it.
async fn write_stream<P: ProgressSink>(
    out: &mut File,
    mut chunks: BoxStream<'static, Result<Vec<u8>>>,
    file: &FileDescriptor,
    tracker: &mut ProgressTracker,
    progress: &mut P,
) -> Result<()> {
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        out.write_all(&chunk).await?;
        if let Some(percent) = tracker.advance(chunk.len()) {
            progress.progress(file, percent);
        }
    }
    out.flush().await?;
    Ok(())
}

/// Remove an incomplete download and describe what was lost.
async fn discard_partial(
    target: &Path,
    file: &FileDescriptor,
    written: u64,
    cause: ReportError,
) -> ReportError {
    if let Err(remove_err) = tokio::fs::remove_file(target).await {
        debug!(path = %target.display(), error = %remove_err, "could not remove partial file");
    }
    ReportError::PartialWrite {
        file: file.name.clone(),
        written,
        message: cause.to_string(),
    }
}
