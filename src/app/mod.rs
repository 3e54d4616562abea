// Outer surfaces: report export and the optional HTTP server.

pub mod export;

#[cfg(feature = "server")]
pub mod progress;
#[cfg(feature = "server")]
pub mod server;
