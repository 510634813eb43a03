mod bind_port;
mod rewrite_url;
mod server;

pub use bind_port::*;
pub use rewrite_url::*;
pub use server::*;
