//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The intent is to avoid
//! reading process-wide environment variables during request handling, which
//! can lead to inconsistent behaviour in multi-threaded runtimes and test
//! harnesses.

use crate::constants::{
    DEFAULT_MAX_ATTEMPTS_PER_SLOT, DEFAULT_MINIMUM_DISTANCE, IDENTIFIERS_DIR_NAME, SETS_FILE_NAME,
};
use crate::{StoreError, StoreResult};
use idmint_barcode::MAX_MINIMUM_DISTANCE;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    minimum_distance: usize,
    max_attempts_per_slot: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `minimum_distance` is the smallest allowed substitution distance
    /// between any two live barcodes; it must be at least 1 and cannot
    /// exceed [`MAX_MINIMUM_DISTANCE`], the largest distance the slice
    /// pre-filter can soundly enforce — a wider minimum would let
    /// violating pairs with disjoint slice sets through the gate unseen.
    /// `max_attempts_per_slot` caps candidate draws per batch-mint slot
    /// and must be at least 1.
    pub fn new(
        data_dir: PathBuf,
        minimum_distance: usize,
        max_attempts_per_slot: u32,
    ) -> StoreResult<Self> {
        if minimum_distance == 0 || minimum_distance > MAX_MINIMUM_DISTANCE {
            return Err(StoreError::InvalidInput(format!(
                "minimum_distance must be between 1 and {MAX_MINIMUM_DISTANCE}, \
                 got {minimum_distance}"
            )));
        }
        if max_attempts_per_slot == 0 {
            return Err(StoreError::InvalidInput(
                "max_attempts_per_slot cannot be zero".into(),
            ));
        }

        Ok(Self {
            data_dir,
            minimum_distance,
            max_attempts_per_slot,
        })
    }

    /// Create a `CoreConfig` with the default distance and retry settings.
    pub fn with_defaults(data_dir: PathBuf) -> StoreResult<Self> {
        Self::new(
            data_dir,
            DEFAULT_MINIMUM_DISTANCE,
            DEFAULT_MAX_ATTEMPTS_PER_SLOT,
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding one JSON document per minted identifier.
    pub fn identifiers_dir(&self) -> PathBuf {
        self.data_dir.join(IDENTIFIERS_DIR_NAME)
    }

    /// Path of the identifier set registry file.
    pub fn sets_file(&self) -> PathBuf {
        self.data_dir.join(SETS_FILE_NAME)
    }

    pub fn minimum_distance(&self) -> usize {
        self.minimum_distance
    }

    pub fn max_attempts_per_slot(&self) -> u32 {
        self.max_attempts_per_slot
    }
}
