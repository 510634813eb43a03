mod load_lockfile;
mod resolved_urls;
mod walk;

pub use load_lockfile::*;
pub use resolved_urls::*;
pub use walk::*;

use serde_json::Value;

/// Content of an `npm-shrinkwrap.json` file.
///
/// The document is kept as an untyped JSON tree: only the resolved URL fields matter,
/// and they can appear at any depth.
#[derive(Debug, Clone, PartialEq)]
pub struct Lockfile {
    pub value: Value,
}

impl Lockfile {
    /// Base file name of the lockfile.
    pub const FILE_NAME: &'static str = "npm-shrinkwrap.json";

    /// Name of the field that holds the resolved URL of a dependency in the lockfile.
    pub const RESOLVED_FIELD: &'static str = "resolved";
}
