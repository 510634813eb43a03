mod sibling_path;
mod write_atomic;

pub use sibling_path::*;
pub use write_atomic::*;
