//! Barcode format, distance, and slicing utilities.
//!
//! idmint shortens version 4 UUIDs to 8-character barcodes while preserving
//! a minimum substitution distance between all live barcodes, so that a
//! single misread character can be corrected without ambiguity (the CualID
//! scheme¹).
//!
//! To keep comparisons deterministic across scanners and keyboards that
//! disagree about case, idmint uses a *canonical* barcode representation:
//! **8 lowercase ASCII alphanumeric characters**.
//!
//! This crate provides:
//! - A small wrapper type ([`Barcode`]) that *guarantees* the canonical form
//!   once constructed, including the default derivation from a UUID.
//! - The substitution-distance functions used by the safety gate
//!   ([`substitution_distance`], [`bounded_distance`]).
//! - The positional slice decomposition ([`slices`]) backing the inverted
//!   pre-filter index.
//!
//! ## Canonical barcode form
//! - Length: 8
//! - Characters: `0-9` and `a-z` only
//! - Example: `44665544`
//!
//! Notes:
//! - The default barcode for a UUID is the head of its final hex group
//!   (characters 20..28 of the 32-character simple form), so freshly minted
//!   barcodes are always lowercase hex.
//! - Externally supplied barcodes (scans, manual corrections) are
//!   case-folded by [`Barcode::parse`]; anything else non-canonical (wrong
//!   width, non-alphanumeric) is rejected.
//!
//! ¹ cual-id: Globally Unique, Correctable, and Human-Friendly Sample
//!   Identifiers for Comparative Omics Studies. Chase et al., mSystems 2015.
//!   <https://www.ncbi.nlm.nih.gov/pmc/articles/PMC5069752/>

mod distance;
mod format;

pub use distance::{bounded_distance, slices, substitution_distance, substitution_distance_ci};
pub use format::Barcode;

/// Width of every barcode, in characters.
pub const BARCODE_LEN: usize = 8;

/// Width of every positional slice, in characters.
///
/// With minimum distance 3 over 8-character barcodes, any two barcodes
/// closer than the minimum must agree on at least one aligned 2-character
/// window, which is what makes slice intersection a sound pre-filter.
pub const SLICE_WIDTH: usize = 2;

/// Largest minimum distance the slice pre-filter can enforce.
///
/// A single substitution destroys at most [`SLICE_WIDTH`] of the
/// `BARCODE_LEN - SLICE_WIDTH + 1` aligned windows, so two barcodes at
/// distance `d` are guaranteed a surviving shared window only while
/// `SLICE_WIDTH * d` stays below the window count. Past that bound a
/// violating pair can have disjoint slice sets (mutate every other
/// position) and the pre-filter would hide it from the exact check, so
/// configurations must not ask the gate to enforce more than this.
pub const MAX_MINIMUM_DISTANCE: usize = (BARCODE_LEN - SLICE_WIDTH) / SLICE_WIDTH + 1;

/// Error type for barcode operations.
#[derive(Debug, thiserror::Error)]
pub enum BarcodeError {
    /// Invalid input provided
    #[error("invalid barcode: {0}")]
    InvalidInput(String),
    /// Distance was requested between strings of different lengths
    #[error("cannot compare strings of unequal length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
}

/// Result type for barcode operations.
pub type BarcodeResult<T> = Result<T, BarcodeError>;
