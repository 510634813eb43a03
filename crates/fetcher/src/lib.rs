mod error;
mod fetch_artifact;
mod reporter;

pub use error::*;
pub use fetch_artifact::*;
pub use reporter::*;
