use crate::core::Pipeline;
use crate::domain::model::{ConversionReport, RunSummary};
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting marker conversion...");

        tracing::debug!("Extracting project and sidecar list...");
        let batch = self.pipeline.extract().await?;
        tracing::info!("Found {} XML sidecar file(s)", batch.sidecars.len());

        tracing::debug!("Transforming...");
        let outcome = self.pipeline.transform(batch).await?;
        tracing::info!(
            "Matched {} clip(s), {} marker(s) to add",
            outcome.report.clips.len(),
            outcome.report.total_markers
        );

        tracing::debug!("Loading...");
        let summary = self.pipeline.load(outcome).await?;
        if let Some(path) = &summary.persisted_to {
            tracing::info!("Project saved to: {}", path);
        }

        Ok(summary)
    }

    /// Extract and transform only; the project on disk is never written.
    pub async fn dry_run(&self) -> Result<ConversionReport> {
        tracing::info!("🔍 DRY RUN - the project file will not be modified");
        let batch = self.pipeline.extract().await?;
        let outcome = self.pipeline.transform(batch).await?;
        Ok(outcome.report)
    }
}
