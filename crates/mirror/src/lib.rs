mod build;
mod download_artifacts;
mod install;
mod mutated_files;

pub use build::*;
pub use download_artifacts::*;
pub use install::*;
