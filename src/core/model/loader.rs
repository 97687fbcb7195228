use super::{Model, ModelBatch};
use crate::core::error::ErrorReporter;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads model definition files into a [`ModelBatch`].
///
/// Bad files never abort the batch: they are reported through the injected
/// [`ErrorReporter`] and skipped.
pub struct ModelLoader {
    extensions: Vec<String>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ModelLoader {
    pub fn new(extensions: &[String], reporter: Arc<dyn ErrorReporter>) -> Self {
        ModelLoader {
            extensions: extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            reporter,
        }
    }

    /// Load every recognized model file reachable from `paths`.
    ///
    /// Directories are walked recursively in file-name order; explicit files
    /// keep the order they were given in.
    pub fn load(&self, paths: &[PathBuf]) -> ModelBatch {
        let mut batch = ModelBatch::new();
        for file in self.collect_files(paths) {
            let models = match parse_model_file(&file) {
                Ok(models) => models,
                Err(reason) => {
                    self.reporter.report_warning(
                        &format!("skipping model file {}", file.display()),
                        Some(reason),
                    );
                    continue;
                }
            };
            for model in models {
                let id = model.id().to_string();
                if !batch.push(model) {
                    self.reporter.report_warning(
                        &format!("duplicate model '{}' ignored", id),
                        Some(file.display().to_string()),
                    );
                }
            }
        }
        tracing::debug!(models = batch.len(), "model batch loaded");
        batch
    }

    fn collect_files(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                self.walk_dir(path, &mut files);
            } else if path.is_file() {
                if self.is_recognized(path) {
                    files.push(path.clone());
                } else {
                    tracing::debug!(path = %path.display(), "not a model file; skipped");
                }
            } else {
                self.reporter.report_warning(
                    &format!("model path {} does not exist", path.display()),
                    None,
                );
            }
        }
        files
    }

    fn walk_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.reporter.report_warning(
                    &format!("cannot read directory {}", dir.display()),
                    Some(err.to_string()),
                );
                return;
            }
        };
        let mut entries: Vec<_> = entries.filter_map(|entry| entry.ok()).collect();
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                self.walk_dir(&path, files);
            } else if path.is_file() && self.is_recognized(&path) {
                files.push(path);
            }
        }
    }

    fn is_recognized(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|known| *known == ext.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Parse one file holding either a single model object or an array of them.
fn parse_model_file(path: &Path) -> Result<Vec<Model>, String> {
    let content = fs::read_to_string(path).map_err(|err| format!("read failed: {}", err))?;
    let value: Value =
        serde_json::from_str(&content).map_err(|err| format!("invalid JSON: {}", err))?;

    let documents = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => return Err("expected a model object or an array of model objects".to_string()),
    };
    if documents.is_empty() {
        return Err("file contains no models".to_string());
    }

    documents
        .into_iter()
        .enumerate()
        .map(|(index, document)| {
            let id = document
                .get("@id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| format!("model #{} has no string '@id'", index))?;
            Ok(Model::new(id, document, path))
        })
        .collect()
}
