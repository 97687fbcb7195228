pub mod config;
pub mod error;
pub mod migration;
pub mod model;
pub mod publisher;
pub mod results_processor;
pub mod types;

pub use config::{ConfigLoader, ConfigValidator, MigrateConfig};
pub use error::{AppError, ErrorReporter, MigrationError, TracingErrorReporter};
pub use migration::{MigrationCoordinator, MigrationOptions, MigrationPipeline, RunOutcome};
pub use model::{Model, ModelBatch, ModelLoader, PublishedSet};
pub use publisher::ModelPublisher;
pub use results_processor::{OutputFormat, ResultsProcessor};
pub use types::*;
