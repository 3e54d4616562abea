// Domain layer: core models, per-probe session state and ports (interfaces).

pub mod model;
pub mod ports;
pub mod session;
