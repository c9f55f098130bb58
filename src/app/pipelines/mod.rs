pub mod marker_pipeline;

pub use marker_pipeline::MarkerPipeline;
