//! Translation between English, Chinese and Russian on top of a downloaded
//! T5 model. Inference itself stays behind [`Seq2SeqModel`].

mod segment;

pub use segment::{join_segments, split_text};

use crate::error::TranslateError;
use crate::models::{REQUIRED_FILES, TRANSLATION_MODEL, missing_files, model_dir};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetLanguage {
    #[default]
    En,
    Zh,
    Ru,
}

impl TargetLanguage {
    pub fn code(self) -> &'static str {
        match self {
            TargetLanguage::En => "en",
            TargetLanguage::Zh => "zh",
            TargetLanguage::Ru => "ru",
        }
    }

    fn prompt(self, segment: &str) -> String {
        format!("translate to {}: {segment}", self.code())
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A loaded sequence-to-sequence model: prompt in, decoded text out.
pub trait Seq2SeqModel {
    fn generate(&mut self, prompt: &str) -> anyhow::Result<String>;
}

/// The connected input wins over the typed one unless it is blank.
pub fn select_input<'a>(input_text: &'a str, connected_input: Option<&'a str>) -> &'a str {
    match connected_input {
        Some(text) if !text.trim().is_empty() => text,
        _ => input_text,
    }
}

pub struct Translator<M> {
    model: M,
    model_path: PathBuf,
}

impl<M: Seq2SeqModel> Translator<M> {
    /// Loads the model from `<models_root>/Translation/<model>` once every
    /// required file is present.
    pub fn load<F>(models_root: &Path, loader: F) -> Result<Self, TranslateError>
    where
        F: FnOnce(&Path) -> anyhow::Result<M>,
    {
        let model_path = model_dir(models_root, TRANSLATION_MODEL);
        let missing = missing_files(&model_path, &REQUIRED_FILES);
        if !missing.is_empty() {
            return Err(TranslateError::ModelMissing {
                model: TRANSLATION_MODEL.to_string(),
                path: model_path,
                missing,
            });
        }

        let model = loader(&model_path).map_err(|source| TranslateError::Load {
            model: TRANSLATION_MODEL.to_string(),
            path: model_path.clone(),
            source,
        })?;
        info!("Loaded {TRANSLATION_MODEL} from {}", model_path.display());

        Ok(Self { model, model_path })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn translate(
        &mut self,
        text: &str,
        target: TargetLanguage,
    ) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let segments = split_text(text);
        let mut translated = Vec::with_capacity(segments.len());
        for segment in segments {
            if segment.is_empty() {
                translated.push(segment);
                continue;
            }
            debug!("Translating {segment:?} to {target}");
            let output = self
                .model
                .generate(&target.prompt(&segment))
                .map_err(|source| TranslateError::Inference {
                    segment: segment.clone(),
                    source,
                })?;
            translated.push(output);
        }

        Ok(join_segments(&translated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Echoes the prompt back, upper-cased, and remembers what it saw.
    #[derive(Default)]
    struct EchoModel {
        prompts: Vec<String>,
    }

    impl Seq2SeqModel for EchoModel {
        fn generate(&mut self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.push(prompt.to_string());
            if prompt.contains("boom") {
                anyhow::bail!("generation failed");
            }
            Ok(prompt.to_uppercase())
        }
    }

    fn installed_root() -> TempDir {
        let root = TempDir::new().unwrap();
        let dir = model_dir(root.path(), TRANSLATION_MODEL);
        fs::create_dir_all(&dir).unwrap();
        for file in REQUIRED_FILES {
            fs::write(dir.join(file), b"x").unwrap();
        }
        root
    }

    #[test]
    fn load_names_missing_files_and_path() {
        let root = installed_root();
        let dir = model_dir(root.path(), TRANSLATION_MODEL);
        fs::remove_file(dir.join("spiece.model")).unwrap();

        let err = Translator::<EchoModel>::load(root.path(), |_| Ok(EchoModel::default()))
            .err()
            .unwrap();

        match &err {
            TranslateError::ModelMissing { missing, path, .. } => {
                assert_eq!(missing, &vec!["spiece.model".to_string()]);
                assert_eq!(path, &dir);
            }
            other => panic!("unexpected error {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains(TRANSLATION_MODEL));
        assert!(message.contains(&dir.display().to_string()));
    }

    #[test]
    fn loader_failure_is_wrapped() {
        let root = installed_root();
        let err = Translator::<EchoModel>::load(root.path(), |_| anyhow::bail!("bad weights"))
            .err()
            .unwrap();
        assert!(matches!(err, TranslateError::Load { .. }));
        assert!(err.to_string().contains("bad weights"));
    }

    #[test]
    fn translates_segment_by_segment() {
        let root = installed_root();
        let mut translator = Translator::load(root.path(), |path| {
            assert!(path.ends_with(TRANSLATION_MODEL));
            Ok(EchoModel::default())
        })
        .unwrap();

        let out = translator
            .translate("你好。世界\n\n\n\nsecond line", TargetLanguage::Ru)
            .unwrap();

        assert_eq!(
            translator.model.prompts,
            vec![
                "translate to ru: 你好。",
                "translate to ru: 世界",
                "translate to ru: second line",
            ]
        );
        assert_eq!(
            out,
            "TRANSLATE TO RU: 你好。\nTRANSLATE TO RU: 世界\n\nTRANSLATE TO RU: SECOND LINE"
        );
    }

    #[test]
    fn blank_input_skips_the_model() {
        let root = installed_root();
        let mut translator = Translator::load(root.path(), |_| Ok(EchoModel::default())).unwrap();
        assert_eq!(translator.translate("  \n ", TargetLanguage::En).unwrap(), "");
        assert!(translator.model.prompts.is_empty());
    }

    #[test]
    fn inference_error_names_segment() {
        let root = installed_root();
        let mut translator = Translator::load(root.path(), |_| Ok(EchoModel::default())).unwrap();
        let err = translator.translate("ok!boom", TargetLanguage::Zh).unwrap_err();
        assert!(matches!(err, TranslateError::Inference { ref segment, .. } if segment == "boom"));
    }

    #[test]
    fn connected_input_wins_unless_blank() {
        assert_eq!(select_input("typed", Some("wired")), "wired");
        assert_eq!(select_input("typed", Some("   ")), "typed");
        assert_eq!(select_input("typed", None), "typed");
    }
}
