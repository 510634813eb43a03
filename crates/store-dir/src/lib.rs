mod store_dir;
mod url_basename;

pub use store_dir::*;
pub use url_basename::*;
