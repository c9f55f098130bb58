use crate::core::extractor::MarkerExtractor;
use crate::core::injector::InjectionEngine;
use crate::core::matcher::ClipMatcher;
use crate::domain::model::{ClipReport, ConversionReport, SidecarInput};
use crate::domain::ports::IdGenerator;
use crate::domain::project::ProjectDocument;
use crate::utils::error::Result;
use std::path::Path;

pub fn is_sidecar(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Regular `.xml` files of `folder`, sorted by name.
pub fn list_sidecars(folder: &Path) -> Result<Vec<SidecarInput>> {
    let mut sidecars = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if is_sidecar(&file_name) {
            sidecars.push(SidecarInput {
                file_name,
                path: entry.path(),
            });
        }
    }
    sidecars.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(sidecars)
}

/// Runs match, extract and inject for every sidecar against one project.
pub struct ConversionDriver<'a, G: IdGenerator + ?Sized> {
    extractor: &'a MarkerExtractor,
    matcher: ClipMatcher,
    ids: &'a G,
}

impl<'a, G: IdGenerator + ?Sized> ConversionDriver<'a, G> {
    pub fn new(extractor: &'a MarkerExtractor, matcher: ClipMatcher, ids: &'a G) -> Self {
        Self {
            extractor,
            matcher,
            ids,
        }
    }

    pub fn run(
        &self,
        project: &mut ProjectDocument,
        sidecars: &[SidecarInput],
    ) -> Result<ConversionReport> {
        let injector = InjectionEngine::new(self.ids);
        let mut report = ConversionReport::default();

        for sidecar in sidecars.iter().filter(|s| is_sidecar(&s.file_name)) {
            report.files_scanned += 1;

            let segments = self.matcher.find_segments(&sidecar.file_name, project);
            if segments.is_empty() {
                tracing::debug!("{}: no matching clip", sidecar.file_name);
                report.files_unmatched += 1;
                continue;
            }

            let markers = self.extractor.extract_file(&sidecar.path);
            if markers.is_empty() {
                tracing::debug!("{}: no shot marks", sidecar.file_name);
                report.files_without_markers += 1;
                continue;
            }

            let prefix = self.matcher.matching_key(&sidecar.file_name);
            tracing::info!(
                "-> Clip {}: found {} shot marks ({} segment(s))",
                prefix,
                markers.len(),
                segments.len()
            );

            for at in &segments {
                injector.inject(project, *at, &markers)?;
                report.total_markers += markers.len();
            }

            report.clips.push(ClipReport {
                file_name: sidecar.file_name.clone(),
                prefix,
                markers: markers.len(),
                segments,
            });
        }

        Ok(report)
    }
}
