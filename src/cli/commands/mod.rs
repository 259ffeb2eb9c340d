//! CLI command implementations

pub mod clean;
pub mod config;
pub mod init;
pub mod path;
pub mod status;

pub use clean::execute as clean;
pub use config::execute as config;
pub use init::execute as init;
pub use path::execute as path;
pub use status::execute as status;
