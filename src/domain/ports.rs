use crate::domain::model::{ConversionOutcome, ExtractedBatch, MarkerSettings, RunSummary};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn copy_file(
        &self,
        from: &str,
        to: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn xml_folder(&self) -> &str;
    fn project_file(&self) -> &str;
    fn prefix_length(&self) -> usize;
    fn marker_settings(&self) -> MarkerSettings;
}

/// Source of fresh ids for marker collections and items.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Upper-case hyphenated UUID v4, the id style the editor itself writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().hyphenated().to_string().to_uppercase()
    }
}

/// Deterministic `<prefix>-<n>` ids, counting from 1.
#[derive(Debug, Default)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedBatch>;
    async fn transform(&self, batch: ExtractedBatch) -> Result<ConversionOutcome>;
    async fn load(&self, outcome: ConversionOutcome) -> Result<RunSummary>;
}
