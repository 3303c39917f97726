// Domain layer: check models and ports. No networking here.

pub mod model;
pub mod ports;
