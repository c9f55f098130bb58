use crate::core::driver::{list_sidecars, ConversionDriver};
use crate::core::extractor::MarkerExtractor;
use crate::core::matcher::ClipMatcher;
use crate::core::{
    ConfigProvider, ConversionOutcome, ExtractedBatch, IdGenerator, Pipeline, RunSummary, Storage,
};
use crate::domain::project::ProjectDocument;
use crate::utils::error::Result;
use std::path::Path;

/// Reads the project through `storage`, converts every sidecar of the
/// configured folder and writes the project back only if markers were added.
pub struct MarkerPipeline<S: Storage, C: ConfigProvider, G: IdGenerator> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) ids: G,
}

impl<S: Storage, C: ConfigProvider, G: IdGenerator> MarkerPipeline<S, C, G> {
    pub fn new(storage: S, config: C, ids: G) -> Self {
        Self {
            storage,
            config,
            ids,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, G: IdGenerator> Pipeline for MarkerPipeline<S, C, G> {
    async fn extract(&self) -> Result<ExtractedBatch> {
        tracing::debug!("Reading project file: {}", self.config.project_file());
        let data = self.storage.read_file(self.config.project_file()).await?;
        let project = ProjectDocument::from_json_slice(&data)?;
        tracing::debug!(
            "Project has {} track(s), {} video material(s), {} time mark collection(s)",
            project.track_count(),
            project.video_materials().count(),
            project.time_marks().len()
        );

        let sidecars = list_sidecars(Path::new(self.config.xml_folder()))?;
        if sidecars.is_empty() {
            tracing::warn!("No XML files found in {}", self.config.xml_folder());
        }

        Ok(ExtractedBatch { project, sidecars })
    }

    async fn transform(&self, batch: ExtractedBatch) -> Result<ConversionOutcome> {
        let ExtractedBatch {
            mut project,
            sidecars,
        } = batch;

        let extractor = MarkerExtractor::new(self.config.marker_settings());
        let matcher = ClipMatcher::new(self.config.prefix_length());
        let report = ConversionDriver::new(&extractor, matcher, &self.ids).run(&mut project, &sidecars)?;

        Ok(ConversionOutcome { project, report })
    }

    async fn load(&self, outcome: ConversionOutcome) -> Result<RunSummary> {
        let ConversionOutcome { project, report } = outcome;

        if !report.has_changes() {
            tracing::debug!("Nothing to write, project left untouched");
            return Ok(RunSummary {
                report,
                persisted_to: None,
            });
        }

        let data = project.to_json_bytes()?;
        tracing::debug!("Writing project ({} bytes)", data.len());
        self.storage
            .write_file(self.config.project_file(), &data)
            .await?;

        Ok(RunSummary {
            report,
            persisted_to: Some(self.config.project_file().to_string()),
        })
    }
}
