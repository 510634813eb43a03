mod manifest_file;
mod mutate;
mod restore;

pub use manifest_file::*;
pub use mutate::*;
pub use restore::*;
