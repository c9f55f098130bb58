pub mod pipelines;
pub mod project_picker;
