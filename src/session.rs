use crate::catalog::SourceEntry;
use crate::error::DownloadError;
use log::{debug, info, warn};
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the client shared by every probe and fetch of a run.
///
/// With `enable_proxy` off the `HTTP_PROXY`/`HTTPS_PROXY` environment is
/// ignored. An explicit proxy URL always wins over the environment.
pub fn build_session(enable_proxy: bool, proxy: Option<&str>) -> Result<Client, DownloadError> {
    let mut builder = Client::builder();

    if proxy.is_some() || !enable_proxy {
        builder = builder.no_proxy();
    }
    if let Some(proxy_url) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    Ok(builder.build()?)
}

/// A source is reachable only if it answers exactly 200 after redirects.
pub async fn probe(client: &Client, base_url: &str) -> bool {
    info!("Checking {base_url}");
    match client.get(base_url).timeout(PROBE_TIMEOUT).send().await {
        Ok(response) => {
            info!("{base_url} answered {}", response.status());
            response.status() == StatusCode::OK
        }
        Err(e) => {
            warn!("{base_url} is unreachable: {e}");
            false
        }
    }
}

pub(crate) fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

/// Expected bytes for a run, plus how many files could not be sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeEstimate {
    pub total_bytes: u64,
    pub sized: usize,
    pub unknown: usize,
}

impl SizeEstimate {
    /// False when at least one file contributed 0 for lack of an answer.
    pub fn is_exact(&self) -> bool {
        self.unknown == 0
    }
}

/// Sums `content-length` over one HEAD per file. A failed or unanswered HEAD
/// adds nothing; this never fails the run.
pub async fn estimate_total_size(
    client: &Client,
    entry: &SourceEntry,
    models: &[String],
    files: &[&str],
) -> SizeEstimate {
    let mut estimate = SizeEstimate::default();

    for model in models {
        if entry.prefix(model).is_none() {
            continue;
        }
        for file in files {
            let Some(url) = entry.file_url(model, file) else {
                continue;
            };
            let length = match client.head(&url).send().await {
                Ok(response) if response.status().is_success() => content_length(response.headers()),
                Ok(response) => {
                    debug!("HEAD {url} answered {}", response.status());
                    None
                }
                Err(e) => {
                    debug!("HEAD {url} failed: {e}");
                    None
                }
            };
            match length {
                Some(bytes) => {
                    estimate.total_bytes += bytes;
                    estimate.sized += 1;
                }
                None => estimate.unknown += 1,
            }
        }
    }

    if !estimate.is_exact() {
        warn!(
            "Could not size {} file(s); progress total is a lower bound",
            estimate.unknown
        );
    }
    estimate
}
