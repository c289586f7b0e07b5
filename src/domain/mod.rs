// Domain layer: core models and ports (interfaces). No external dependencies beyond std/serde/chrono.

pub mod hierarchy;
pub mod model;
pub mod ports;
pub mod snapshot;
