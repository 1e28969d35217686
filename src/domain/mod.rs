// Domain layer: case records and the ports (HTTP, browser, storage) the engine consumes.

pub mod model;
pub mod ports;
