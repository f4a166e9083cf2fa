use crate::catalog::ModelSource;
use crate::config::DownloadConfig;
use crate::error::DownloadError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zh-en-ru-translator")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download the translation model files from a mirror
    Download(DownloadArgs),
    /// Show which model files are complete, partial or missing
    Status(StatusArgs),
}

#[derive(clap::Args, Debug)]
pub struct CommonArgs {
    /// Models root; files land in <root>/Translation/<model>/ (default: ./models)
    #[arg(short, long)]
    pub models_root: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Model source (default: hf-mirror.com)
    #[arg(short, long, value_enum)]
    pub source: Option<ModelSource>,

    /// Use the proxy configured in HTTP_PROXY / HTTPS_PROXY
    #[arg(long, conflicts_with = "no_proxy")]
    pub enable_proxy: bool,

    /// Ignore proxy environment variables even if the config file enables them
    #[arg(long)]
    pub no_proxy: bool,

    /// HTTP proxy (e.g., http://127.0.0.1:7890)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Number of parallel downloads (default: 16)
    #[arg(
        short = 'j',
        long,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub concurrency: Option<usize>,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Print per-file states as JSON
    #[arg(long)]
    pub json: bool,
}

impl CommonArgs {
    pub fn resolve(&self) -> Result<DownloadConfig, DownloadError> {
        let mut config = match &self.config {
            Some(path) => DownloadConfig::load_from_path(path)?,
            None => DownloadConfig::default(),
        };
        if let Some(root) = &self.models_root {
            config.models_root = root.clone();
        }
        Ok(config)
    }
}

impl DownloadArgs {
    pub fn resolve(&self) -> Result<DownloadConfig, DownloadError> {
        let mut config = self.common.resolve()?;
        if let Some(source) = self.source {
            config.source = source;
        }
        if self.enable_proxy {
            config.enable_proxy = true;
        } else if self.no_proxy {
            config.enable_proxy = false;
        }
        if let Some(proxy) = &self.proxy {
            config.proxy = Some(proxy.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        Ok(config)
    }
}
