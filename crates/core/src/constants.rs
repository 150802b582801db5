//! Constants used throughout the idmint core crate.
//!
//! This module contains all path and filename constants plus numeric
//! defaults to ensure consistency across the codebase and make maintenance
//! easier.

/// Directory name for minted identifier documents, under the data directory.
pub const IDENTIFIERS_DIR_NAME: &str = "identifiers";

/// Filename for the identifier set registry, under the data directory.
pub const SETS_FILE_NAME: &str = "sets.json";

/// Default data directory when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "idmint_data";

/// Default minimum substitution distance between any two live barcodes.
///
/// Three tolerates a single misread character: the corrupted barcode is
/// still strictly closer to its origin than to any other live barcode.
pub const DEFAULT_MINIMUM_DISTANCE: usize = 3;

/// Default ceiling on candidate draws per batch-mint slot before the batch
/// aborts with a mint-exhausted error.
pub const DEFAULT_MAX_ATTEMPTS_PER_SLOT: u32 = 1000;
