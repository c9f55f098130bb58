pub mod driver;
pub mod etl;
pub mod extractor;
pub mod injector;
pub mod matcher;

pub use crate::domain::model::{ConversionOutcome, ExtractedBatch, MarkerEvent, RunSummary};
pub use crate::domain::ports::{ConfigProvider, IdGenerator, Pipeline, Storage};
pub use crate::utils::error::Result;
