mod error;
mod loader;
mod model;
pub mod template;

pub use error::*;
pub use loader::*;
pub use model::*;
