//! npm cache layer contribution

use crate::contributor::CACHE_DIR;
use crate::error::{ModlayerError, ModlayerResult};
use crate::fs;
use crate::layer::{Contribution, Layer};
use async_trait::async_trait;
use std::path::Path;

/// Moves an `npm-cache` directory shipped with the app into the cache layer
pub(crate) struct NpmCache<'a> {
    pub app_root: &'a Path,
}

#[async_trait]
impl<'a> Contribution for NpmCache<'a> {
    async fn contribute(&self, layer: &Layer) -> ModlayerResult<()> {
        tokio::fs::create_dir_all(&layer.root).await.map_err(|e| {
            ModlayerError::io(
                format!("unable to make npm cache layer {}", layer.root.display()),
                e,
            )
        })?;

        let npm_cache = self.app_root.join(CACHE_DIR);
        if fs::exists(&npm_cache)? {
            fs::relocate(npm_cache, layer.root.join(CACHE_DIR)).await?;
        }

        Ok(())
    }
}
