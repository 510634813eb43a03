mod config;
mod project_manifest;
mod root_dir;

pub use config::*;
pub use project_manifest::*;
pub use root_dir::*;
