// Domain layer: marker and project models plus the ports (interfaces) the pipeline runs against.

pub mod model;
pub mod ports;
pub mod project;
