//! Error types for the identifier store and minting orchestrator.
//!
//! The variants fall into the classes the orchestrator cares about:
//! rejections of a *candidate* (exclusion violations and exact collisions)
//! are expected under load and safe to retry with a fresh random value;
//! everything else means the batch cannot succeed by retrying and must
//! abort. [`StoreError::is_retryable`] encodes that split.

use idmint_barcode::{Barcode, BarcodeError};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Barcode(#[from] BarcodeError),
    #[error("no identifier set named «{0}»")]
    UnknownSet(String),
    #[error("identifier «{0}» not found")]
    UnknownIdentifier(String),
    #[error(
        "barcode «{barcode}» is within the minimum distance {minimum_distance} \
         of existing barcode «{conflict}»"
    )]
    ExclusionViolation {
        barcode: Barcode,
        minimum_distance: usize,
        conflict: Barcode,
    },
    #[error("barcode «{0}» already exists")]
    BarcodeTaken(Barcode),
    #[error("identifier uuid {0} already exists")]
    UuidTaken(Uuid),
    #[error("could not mint an identifier for slot {slot} after {attempts} attempts")]
    MintExhausted { slot: usize, attempts: u32 },
    #[error("identifier store lock poisoned by an earlier panic")]
    LockPoisoned,
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write identifier file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read identifier file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
}

impl StoreError {
    /// Whether a fresh random candidate could plausibly succeed where this
    /// attempt failed.
    ///
    /// Exclusion violations and exact barcode/UUID collisions are properties
    /// of the rejected candidate, not of the request; the minting loop
    /// retries them. Everything else (unknown set, storage failures, a
    /// poisoned lock) would fail identically on retry and aborts the batch.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::ExclusionViolation { .. }
                | StoreError::BarcodeTaken(_)
                | StoreError::UuidTaken(_)
        )
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
