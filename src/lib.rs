pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::pipelines::MarkerPipeline;
pub use config::{LocalStorage, TomlConfig};
pub use crate::core::{
    driver::ConversionDriver, etl::EtlEngine, extractor::MarkerExtractor,
    injector::InjectionEngine, matcher::ClipMatcher,
};
pub use domain::model::{ClassificationRule, ConversionReport, MarkerEvent, MarkerSettings};
pub use domain::ports::{IdGenerator, SequentialIds, UuidGenerator};
pub use domain::project::ProjectDocument;
pub use utils::error::{EtlError, Result};
