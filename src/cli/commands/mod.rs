//! CLI command implementations

pub mod build;
pub mod config;
pub mod fingerprint;

pub use build::execute as build;
pub use config::execute as config;
pub use fingerprint::execute as fingerprint;
