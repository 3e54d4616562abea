// Adapters layer: concrete implementations for external systems (booking site over HTTP, local files).

pub mod http;
pub mod storage;
