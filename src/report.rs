use crate::error::DownloadError;
use crate::models::{TransferState, model_dir};
use serde::Serialize;
use std::path::Path;

/// Per-model, per-file summary read back from disk.
///
/// A file counts as downloaded iff it exists at its final path, whatever the
/// run in between reported.
pub fn render_report(models_root: &Path, models: &[String], files: &[&str]) -> String {
    let mut text = String::from("Download results:\n\n");
    for model in models {
        let dir = model_dir(models_root, model);
        text.push_str(&model_header(models_root, model));
        for file in files {
            let outcome = if dir.join(file).exists() {
                "downloaded"
            } else {
                "failed or not downloaded"
            };
            text.push_str(&format!("  - {file}: {outcome}\n"));
        }
        text.push('\n');
    }
    text
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileState {
    pub model: String,
    pub file: String,
    #[serde(flatten)]
    pub state: TransferState,
}

pub fn collect_states(models_root: &Path, models: &[String], files: &[&str]) -> Vec<FileState> {
    let mut states = Vec::with_capacity(models.len() * files.len());
    for model in models {
        let dir = model_dir(models_root, model);
        for file in files {
            states.push(FileState {
                model: model.clone(),
                file: file.to_string(),
                state: TransferState::on_disk(&dir.join(file)),
            });
        }
    }
    states
}

/// Like [`render_report`], but names the partial state of unfinished files.
pub fn render_status(models_root: &Path, states: &[FileState]) -> String {
    let mut text = String::new();
    let mut current: Option<&str> = None;
    for entry in states {
        if current != Some(entry.model.as_str()) {
            if current.is_some() {
                text.push('\n');
            }
            text.push_str(&model_header(models_root, &entry.model));
            current = Some(entry.model.as_str());
        }
        text.push_str(&format!("  - {}: {}\n", entry.file, entry.state));
    }
    text
}

fn model_header(models_root: &Path, model: &str) -> String {
    format!(
        "Model: {model}\nDirectory: {}\n",
        model_dir(models_root, model).display()
    )
}

/// One-line report for a run that never got to fetch anything.
pub fn render_fatal(err: &DownloadError) -> String {
    match err {
        DownloadError::UnknownSource(source) => {
            format!("Error: cannot resolve URLs for model source {source}.")
        }
        DownloadError::Unreachable(source) => format!(
            "Error: cannot reach model source {source}; check the network connection or try another source."
        ),
        other => format!("Error: {other}"),
    }
}
