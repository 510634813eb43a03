pub mod bin;
#[cfg(unix)]
pub mod fake_npm;
pub mod fs;
