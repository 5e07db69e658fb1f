pub mod aggregator;
pub mod calculators;
pub mod lexical;
pub mod models;
pub mod offline;
pub mod summary;

pub use aggregator::*;
pub use calculators::*;
pub use lexical::*;
pub use models::*;
pub use offline::*;
pub use summary::*;
