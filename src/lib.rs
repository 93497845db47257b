//! modlayer - fingerprinted node_modules layers
//!
//! Decides per build whether an application's dependencies are reused
//! from the previous build, installed fresh, or rebuilt from a vendored
//! tree, and persists the result as a layer keyed by the lock file hash.

pub mod cli;
pub mod config;
pub mod contributor;
pub mod error;
pub mod fingerprint;
pub mod fs;
pub mod layer;
pub mod npm;
pub mod plan;

pub use error::{ModlayerError, ModlayerResult};
