use crate::catalog::{ModelSource, SourceCatalog, SourceEntry};
use crate::error::DownloadError;
use crate::models::{DownloadTarget, TransferState, model_dir};
use crate::progress::ProgressCounter;
use crate::session::{SizeEstimate, content_length, estimate_total_size, probe};
use futures::future::join_all;
use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task;

pub const CHUNK_SIZE: usize = 8192;
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Outcome of one file fetch. Every failure ends up here rather than as an
/// `Err`, so the worker pool never sees a failed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Downloaded { file_name: String },
    NetworkError { file_name: String, message: String },
    Failed { file_name: String, message: String },
}

impl FetchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchStatus::Downloaded { .. })
    }

    pub fn file_name(&self) -> &str {
        match self {
            FetchStatus::Downloaded { file_name }
            | FetchStatus::NetworkError { file_name, .. }
            | FetchStatus::Failed { file_name, .. } => file_name,
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::Downloaded { file_name } => write!(f, "{file_name} downloaded"),
            FetchStatus::NetworkError { file_name, message } => {
                write!(f, "{file_name} failed: network error - {message}")
            }
            FetchStatus::Failed { file_name, message } => write!(f, "{file_name} failed: {message}"),
        }
    }
}

impl From<&FetchStatus> for TransferState {
    fn from(status: &FetchStatus) -> Self {
        match status {
            FetchStatus::Downloaded { .. } => TransferState::Completed,
            other => TransferState::Failed(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
enum FetchError {
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Downloads one file into its `.tmp` sibling, resuming from whatever the
/// temp file already holds, then renames it into place.
///
/// The final path is written exactly once, by the rename after the whole
/// body was read. A temp file that no longer matches the remote file (a
/// changed upstream, or one already longer than the source) is not detected.
pub async fn fetch_file(
    client: &Client,
    target: &DownloadTarget,
    progress: Option<&ProgressCounter>,
) -> FetchStatus {
    let file_name = target.file_name.clone();
    info!("Downloading {} - {}", target.model_name, file_name);
    let start = Instant::now();

    match try_fetch(client, target, progress).await {
        Ok(bytes) => {
            info!(
                "{file_name} finished ({bytes} bytes) in {:.2}s",
                start.elapsed().as_secs_f64()
            );
            FetchStatus::Downloaded { file_name }
        }
        Err(FetchError::Network(e)) => {
            error!("{file_name}: network error - {e}");
            FetchStatus::NetworkError {
                file_name,
                message: e.to_string(),
            }
        }
        Err(FetchError::Io(e)) => {
            error!("{file_name}: {e}");
            FetchStatus::Failed {
                file_name,
                message: e.to_string(),
            }
        }
    }
}

async fn try_fetch(
    client: &Client,
    target: &DownloadTarget,
    progress: Option<&ProgressCounter>,
) -> Result<u64, FetchError> {
    let temp_path = target.temp_path();

    let initial_pos = match fs::metadata(&temp_path).await {
        Ok(meta) => Some(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    let mut request = client.get(&target.source_url);
    if let Some(pos) = initial_pos {
        debug!("Resuming {} from byte {pos}", target.file_name);
        request = request.header("Range", format!("bytes={pos}-"));
    }

    let mut response = request.send().await?.error_for_status()?;
    let resuming = initial_pos.is_some();
    let initial_pos = initial_pos.unwrap_or(0);
    if initial_pos > 0 && response.status() != StatusCode::PARTIAL_CONTENT {
        warn!(
            "{} answered {} to a range request; appending anyway",
            target.file_name,
            response.status()
        );
    }
    let expected = content_length(response.headers()).map(|len| initial_pos + len);

    let mut file = if resuming {
        OpenOptions::new().create(true).append(true).open(&temp_path).await?
    } else {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .await?
    };

    let mut written = initial_pos;
    let mut pending = Vec::with_capacity(CHUNK_SIZE);
    while let Some(bytes) = response.chunk().await? {
        let mut data = &bytes[..];
        while !data.is_empty() {
            let take = (CHUNK_SIZE - pending.len()).min(data.len());
            pending.extend_from_slice(&data[..take]);
            data = &data[take..];
            if pending.len() == CHUNK_SIZE {
                written += write_chunk(&mut file, &pending, progress).await?;
                pending.clear();
            }
        }
    }
    if !pending.is_empty() {
        written += write_chunk(&mut file, &pending, progress).await?;
    }
    file.flush().await?;
    drop(file);

    if let Some(expected) = expected {
        if written != expected {
            warn!(
                "{}: expected {expected} bytes, wrote {written}",
                target.file_name
            );
        }
    }

    fs::rename(&temp_path, &target.destination_path).await?;
    Ok(written)
}

async fn write_chunk(
    file: &mut fs::File,
    chunk: &[u8],
    progress: Option<&ProgressCounter>,
) -> io::Result<u64> {
    file.write_all(chunk).await?;
    let n = chunk.len() as u64;
    if let Some(progress) = progress {
        progress.add(n);
    }
    Ok(n)
}

/// What one orchestration run did. The report shown to users is derived
/// from disk afterwards, not from these statuses.
#[derive(Debug, Default)]
pub struct DownloadRun {
    pub estimate: SizeEstimate,
    pub statuses: Vec<FetchStatus>,
    pub model_errors: Vec<DownloadError>,
    pub skipped: usize,
    pub bytes: u64,
}

impl DownloadRun {
    pub fn scheduled(&self) -> usize {
        self.statuses.len()
    }

    pub fn failed(&self) -> usize {
        self.statuses.iter().filter(|s| !s.is_success()).count()
    }
}

pub struct Downloader {
    client: Client,
    models_root: PathBuf,
    concurrency: usize,
}

impl Downloader {
    pub fn new(client: Client, models_root: impl Into<PathBuf>, concurrency: usize) -> Self {
        Self {
            client,
            models_root: models_root.into(),
            concurrency: concurrency.max(1),
        }
    }

    pub fn models_root(&self) -> &Path {
        &self.models_root
    }

    /// Probe, size, then fetch every missing file of `models` from `source`.
    ///
    /// Only an unknown or unreachable source fails the whole run.
    pub async fn run(
        &self,
        catalog: &SourceCatalog,
        source: ModelSource,
        models: &[String],
        files: &[&str],
        show_progress: bool,
    ) -> Result<DownloadRun, DownloadError> {
        let entry = catalog
            .entry(source)
            .ok_or_else(|| DownloadError::UnknownSource(source.to_string()))?;

        if !probe(&self.client, &entry.base_url).await {
            return Err(DownloadError::Unreachable(source.to_string()));
        }

        let estimate = estimate_total_size(&self.client, entry, models, files).await;
        info!("Expecting {} bytes in total", estimate.total_bytes);

        let progress = Arc::new(if show_progress {
            ProgressCounter::with_bar(estimate.total_bytes)
        } else {
            ProgressCounter::new()
        });

        let mut run = self.download_all(entry, models, files, Arc::clone(&progress)).await;
        progress.finish();
        run.estimate = estimate;
        Ok(run)
    }

    /// Fans out one fetch per missing file, at most `concurrency` at a time,
    /// and waits for all of them.
    pub async fn download_all(
        &self,
        entry: &SourceEntry,
        models: &[String],
        files: &[&str],
        progress: Arc<ProgressCounter>,
    ) -> DownloadRun {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut run = DownloadRun::default();
        let mut handles = Vec::new();

        for model in models {
            if entry.prefix(model).is_none() {
                let err = DownloadError::UnknownModel {
                    mirror: entry.source.to_string(),
                    model: model.clone(),
                };
                error!("{err}");
                run.model_errors.push(err);
                continue;
            }

            let dir = model_dir(&self.models_root, model);
            if let Err(e) = fs::create_dir_all(&dir).await {
                let err = DownloadError::Io { path: dir, error: e };
                error!("{err}");
                run.model_errors.push(err);
                continue;
            }

            for file in files {
                let Some(url) = entry.file_url(model, file) else {
                    continue;
                };
                let target = DownloadTarget::new(model, file, url, &dir);

                if let Ok(meta) = fs::metadata(&target.destination_path).await {
                    info!("{file} already exists, skipping");
                    progress.add(meta.len());
                    run.skipped += 1;
                    continue;
                }

                let semaphore = Arc::clone(&semaphore);
                let progress = Arc::clone(&progress);
                let client = self.client.clone();
                let file_name = target.file_name.clone();

                let handle = task::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    fetch_file(&client, &target, Some(&progress)).await
                });
                handles.push((file_name, handle));
            }
        }

        let (names, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        run.statuses = join_all(handles)
            .await
            .into_iter()
            .zip(names)
            .map(|(result, file_name)| match result {
                Ok(status) => status,
                Err(e) => FetchStatus::Failed {
                    file_name,
                    message: format!("task error: {e}"),
                },
            })
            .collect();

        for status in &run.statuses {
            debug!("{status}");
        }
        run.bytes = progress.bytes();
        info!(
            "Done: {} downloaded, {} failed, {} already present",
            run.scheduled() - run.failed(),
            run.failed(),
            run.skipped
        );
        run
    }
}
