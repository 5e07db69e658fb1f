pub mod domain;
pub mod error;
pub mod text;
pub mod traits;

pub use domain::*;
pub use error::*;
pub use text::*;
pub use traits::*;
