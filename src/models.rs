use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const TRANSLATION_MODEL: &str = "t5_translate_en_ru_zh_small_1024";

/// Files a model directory must hold before the translator can load it.
pub const REQUIRED_FILES: [&str; 7] = [
    "config.json",
    "model.safetensors",
    "tokenizer_config.json",
    "spiece.model",
    "special_tokens_map.json",
    "added_tokens.json",
    "generation_config.json",
];

pub const TEMP_SUFFIX: &str = ".tmp";

const TRANSLATION_DIR: &str = "Translation";

/// `<models_root>/Translation/<model>`
pub fn model_dir(models_root: &Path, model: &str) -> PathBuf {
    models_root.join(TRANSLATION_DIR).join(model)
}

/// Staging path for an in-flight download of `destination`.
pub fn temp_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Entries of `files` that are not at their final path under `dir`.
pub fn missing_files(dir: &Path, files: &[&str]) -> Vec<String> {
    files
        .iter()
        .filter(|file| !dir.join(file).exists())
        .map(|file| file.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub model_name: String,
    pub file_name: String,
    pub source_url: String,
    pub destination_path: PathBuf,
}

impl DownloadTarget {
    pub fn new(model_name: &str, file_name: &str, source_url: String, model_dir: &Path) -> Self {
        Self {
            model_name: model_name.to_string(),
            file_name: file_name.to_string(),
            source_url,
            destination_path: model_dir.join(file_name),
        }
    }

    pub fn temp_path(&self) -> PathBuf {
        temp_path(&self.destination_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum TransferState {
    Pending,
    InProgress(u64),
    Completed,
    Failed(String),
}

impl TransferState {
    /// Only `Completed` and `InProgress` survive a restart; both are read
    /// back from the final file and its temp sibling.
    pub fn on_disk(destination: &Path) -> Self {
        if destination.exists() {
            return TransferState::Completed;
        }
        match fs::metadata(temp_path(destination)) {
            Ok(meta) => TransferState::InProgress(meta.len()),
            Err(_) => TransferState::Pending,
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferState::Pending => write!(f, "pending"),
            TransferState::InProgress(bytes) => write!(f, "in progress ({bytes} bytes)"),
            TransferState::Completed => write!(f, "completed"),
            TransferState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
