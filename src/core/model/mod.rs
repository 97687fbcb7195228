pub mod loader;
pub mod version;

pub use loader::ModelLoader;
pub use version::{predecessor_of, split_version};

use serde_json::Value;
use std::path::{Path, PathBuf};

/// A model definition parsed from a local file.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    id: String,
    document: Value,
    source: PathBuf,
}

impl Model {
    pub fn new(id: impl Into<String>, document: Value, source: impl Into<PathBuf>) -> Self {
        Model {
            id: id.into(),
            document,
            source: source.into(),
        }
    }

    /// Value of the document's `@id`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The document exactly as it will be uploaded.
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Insertion-ordered set of models read for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelBatch {
    models: Vec<Model>,
}

impl ModelBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a model. Returns `false` and leaves the batch unchanged when a
    /// model with the same identifier is already present.
    pub fn push(&mut self, model: Model) -> bool {
        if self.contains(model.id()) {
            return false;
        }
        self.models.push(model);
        true
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.models.iter().any(|model| model.id() == model_id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.models.iter().map(|model| model.id().to_string()).collect()
    }

    /// Documents in batch order, ready for the registry upload.
    pub fn documents(&self) -> Vec<Value> {
        self.models
            .iter()
            .map(|model| model.document().clone())
            .collect()
    }
}

impl FromIterator<Model> for ModelBatch {
    fn from_iter<I: IntoIterator<Item = Model>>(iter: I) -> Self {
        let mut batch = ModelBatch::new();
        for model in iter {
            batch.push(model);
        }
        batch
    }
}

/// Models the registry has accepted; the authoritative input for migration.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedSet {
    batch: ModelBatch,
}

impl PublishedSet {
    pub(crate) fn accepted(batch: ModelBatch) -> Self {
        PublishedSet { batch }
    }

    /// Treat a batch as published without contacting the registry. Used for
    /// dry runs, where nothing is uploaded.
    pub fn assume_published(batch: ModelBatch) -> Self {
        PublishedSet { batch }
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.batch.model_ids()
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}
