use std::path::PathBuf;
use thiserror::Error;

/// Failures of a download run as a whole, or of one model inside it.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("unknown model source: {0}")]
    UnknownSource(String),

    #[error("model source {mirror} has no URL prefix for model {model}")]
    UnknownModel { mirror: String, model: String },

    #[error("model source {0} is not reachable")]
    Unreachable(String),

    #[error("invalid URL prefix for {model} on {mirror}: {prefix}")]
    InvalidPrefix {
        mirror: String,
        model: String,
        prefix: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error on {}: {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("invalid config file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

/// Failures of the translation node.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(
        "cannot load model {model}: required files are missing ({}). Download the model first.\nexpected model path: {}",
        missing.join(", "),
        path.display()
    )]
    ModelMissing {
        model: String,
        path: PathBuf,
        missing: Vec<String>,
    },

    #[error("cannot load model {model} from {}: {source}", path.display())]
    Load {
        model: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("translation failed for segment {segment:?}: {source}")]
    Inference {
        segment: String,
        #[source]
        source: anyhow::Error,
    },
}
