//! On-disk cache for built skeletons.
//!
//! A skeleton is expensive to derive but cheap to reload, so each
//! (catalog identity, filter) pair is serialized once and picked up by every
//! later run. The cache is strictly best-effort: a missing, unreadable, or
//! corrupt entry falls back to rebuilding from the catalog, and entries are
//! written through a temp file and atomically renamed so a crashed writer
//! can never leave a truncated skeleton behind.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::reaction::ReactionFilter;
use crate::catalog::CatalogSource;
use crate::optimize::skeleton::{BuildError, Skeleton, SkeletonBuilder};
use crate::utils::hashing::cache_key;

/// File-backed skeleton store rooted at a directory
#[derive(Clone, Debug)]
pub struct SkeletonCache {
    directory: PathBuf,
}

impl SkeletonCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        SkeletonCache {
            directory: directory.into(),
        }
    }

    /// Path an entry for this (identity, filter) pair lives at
    pub fn entry_path(&self, identity: &str, filter: ReactionFilter) -> PathBuf {
        self.directory
            .join(format!("{}.skeleton.json", cache_key(identity, filter.tag())))
    }

    /// Persist a skeleton under its (catalog identity, filter) key.
    ///
    /// The write goes through a temp file in the cache directory and an
    /// atomic rename, so concurrent readers only ever see complete entries.
    pub fn store(&self, skeleton: &Skeleton) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.entry_path(&skeleton.catalog_id, skeleton.filter);
        let staged = NamedTempFile::new_in(&self.directory)?;
        serde_json::to_writer(staged.as_file(), skeleton)?;
        staged
            .persist(&path)
            .map_err(|persist_error| CacheError::Io(persist_error.error))?;
        debug!(path = %path.display(), "stored skeleton");
        Ok(path)
    }

    /// Reconstruct a skeleton from its cached entry
    pub fn load(&self, identity: &str, filter: ReactionFilter) -> Result<Skeleton, CacheError> {
        let path = self.entry_path(identity, filter);
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<Skeleton, CacheError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// The pure-cache contract: return the cached skeleton when possible,
    /// otherwise rebuild from the catalog and try to re-store.
    ///
    /// Cache failures in either direction are logged and absorbed; only a
    /// failed *build* propagates.
    pub fn load_or_build(
        &self,
        source: &dyn CatalogSource,
        filter: ReactionFilter,
    ) -> Result<Skeleton, BuildError> {
        match self.load(source.identity(), filter) {
            Ok(skeleton) => {
                debug!(catalog = source.identity(), "loaded skeleton from cache");
                Ok(skeleton)
            }
            Err(error) => {
                warn!(%error, catalog = source.identity(), "skeleton cache miss, rebuilding");
                let skeleton = SkeletonBuilder::new(filter).build(source)?;
                if let Err(error) = self.store(&skeleton) {
                    warn!(%error, "could not store rebuilt skeleton");
                }
                Ok(skeleton)
            }
        }
    }
}

/// Skeleton cache failures; never fatal, always recoverable by rebuilding
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache entry could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}
