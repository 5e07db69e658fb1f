pub mod config;
pub mod input;
pub mod metric;
pub mod report;

pub use config::*;
pub use input::*;
pub use metric::*;
pub use report::*;
