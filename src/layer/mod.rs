//! Fingerprinted layers
//!
//! A layer is a directory persisted across builds together with the
//! fingerprint of what produced it. The [`LayerStore`] compares that
//! fingerprint on each build and only re-runs a [`Contribution`] when it
//! changed.

pub mod dir;
pub mod memory;
pub mod store;
pub mod types;

pub use dir::DirLayerStore;
pub use memory::MemoryLayerStore;
pub use store::{Contribution, LayerStore};
pub use types::{
    ContributeOutcome, LaunchMetadata, Layer, LayerFlag, LayerFlags, LayerMetadata, Process,
};
