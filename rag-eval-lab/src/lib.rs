//! Command-line front end for the RAG evaluator: layered configuration,
//! HTTP model backends, batch input and report rendering.

pub mod backends;
pub mod batch;
pub mod config;
pub mod output;
pub mod telemetry;

pub use backends::*;
pub use batch::*;
pub use self::config::{BackendsConfig, EndpointConfig, LabConfig, LogFormat, LoggingConfig};
pub use output::*;
