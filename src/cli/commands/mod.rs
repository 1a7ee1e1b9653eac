//! CLI command implementations

pub mod compile;
pub mod config;
pub mod scan;

pub use compile::execute as compile;
pub use config::execute as config;
pub use scan::execute as scan;
