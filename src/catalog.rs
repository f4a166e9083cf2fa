use crate::error::DownloadError;
use clap::ValueEnum;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Mirrors the translation model can be fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
pub enum ModelSource {
    #[default]
    #[value(name = "hf-mirror.com")]
    #[serde(rename = "hf-mirror.com")]
    HfMirror,
    #[value(name = "modelscope.cn")]
    #[serde(rename = "modelscope.cn")]
    ModelScope,
    #[value(name = "huggingface.co")]
    #[serde(rename = "huggingface.co")]
    HuggingFace,
}

impl ModelSource {
    pub const ALL: [ModelSource; 3] = [
        ModelSource::HfMirror,
        ModelSource::ModelScope,
        ModelSource::HuggingFace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelSource::HfMirror => "hf-mirror.com",
            ModelSource::ModelScope => "modelscope.cn",
            ModelSource::HuggingFace => "huggingface.co",
        }
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelSource {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelSource::ALL
            .into_iter()
            .find(|source| source.name() == s.trim())
            .ok_or_else(|| DownloadError::UnknownSource(s.to_string()))
    }
}

/// Where one mirror serves its files from.
///
/// A file URL is the model's prefix with the file name appended verbatim, so
/// prefixes end either in `/` or in a query parameter awaiting a value.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub source: ModelSource,
    pub base_url: String,
    prefixes: HashMap<String, String>,
}

impl SourceEntry {
    pub fn new(source: ModelSource, base_url: impl Into<String>) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            prefixes: HashMap::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(model.into(), prefix.into());
        self
    }

    pub fn prefix(&self, model: &str) -> Option<&str> {
        self.prefixes.get(model).map(String::as_str)
    }

    pub fn file_url(&self, model: &str, file_name: &str) -> Option<String> {
        self.prefix(model).map(|prefix| format!("{prefix}{file_name}"))
    }

    fn validate(&self) -> Result<(), DownloadError> {
        check_absolute(&self.base_url).ok_or_else(|| DownloadError::InvalidPrefix {
            mirror: self.source.to_string(),
            model: "<base>".to_string(),
            prefix: self.base_url.clone(),
        })?;

        for (model, prefix) in &self.prefixes {
            check_absolute(prefix).ok_or_else(|| DownloadError::InvalidPrefix {
                mirror: self.source.to_string(),
                model: model.clone(),
                prefix: prefix.clone(),
            })?;
        }

        Ok(())
    }
}

fn check_absolute(url: &str) -> Option<Url> {
    Url::parse(url)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

/// Read-only table of mirrors, checked once when it is built.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    entries: Vec<SourceEntry>,
}

impl SourceCatalog {
    pub fn new(entries: Vec<SourceEntry>) -> Result<Self, DownloadError> {
        for entry in &entries {
            entry.validate()?;
        }
        Ok(Self { entries })
    }

    pub fn builtin() -> Result<Self, DownloadError> {
        Self::new(vec![
            SourceEntry::new(ModelSource::HfMirror, "https://hf-mirror.com").with_model(
                crate::models::TRANSLATION_MODEL,
                "https://hf-mirror.com/utrobinmv/t5_translate_en_ru_zh_small_1024/resolve/main/",
            ),
            SourceEntry::new(ModelSource::ModelScope, "https://modelscope.cn").with_model(
                crate::models::TRANSLATION_MODEL,
                "https://modelscope.cn/api/v1/models/cubeai/t5_translate_en_ru_zh_small_1024/repo?Revision=master&FilePath=",
            ),
            SourceEntry::new(ModelSource::HuggingFace, "https://huggingface.co").with_model(
                crate::models::TRANSLATION_MODEL,
                "https://huggingface.co/utrobinmv/t5_translate_en_ru_zh_small_1024/resolve/main/",
            ),
        ])
    }

    pub fn entry(&self, source: ModelSource) -> Option<&SourceEntry> {
        self.entries.iter().find(|entry| entry.source == source)
    }
}
