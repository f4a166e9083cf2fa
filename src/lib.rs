//! Download and run the `t5_translate_en_ru_zh_small_1024` translation model.
//!
//! The downloader fetches the model's files from one of several mirrors, in
//! parallel, resuming partial files from their `.tmp` siblings. The
//! translator checks those files are in place and drives an external
//! sequence-to-sequence model over segmented text.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod models;
pub mod progress;
pub mod report;
pub mod session;
pub mod translate;

#[cfg(test)]
mod testing;

pub use catalog::{ModelSource, SourceCatalog, SourceEntry};
pub use downloader::{DownloadRun, Downloader, FetchStatus, fetch_file};
pub use error::{DownloadError, TranslateError};
pub use progress::ProgressCounter;
