//! # idmint core
//!
//! Core logic for the idmint identifier authority: minting globally
//! unique, collision-resistant, optically distinguishable barcodes from
//! UUIDs under concurrent writers.
//!
//! This crate contains pure data operations and file/folder management:
//! - The identifier set registry and the minted-identifier population,
//!   stored as sharded JSON documents
//! - The barcode-safety gate enforcing the minimum-distance invariant
//!   behind one exclusive population lock
//! - The batch minting orchestrator and its retry statistics
//!
//! **No API concerns**: CLI parsing and HTTP servers belong in `cli` and
//! `api-rest`.

pub mod config;
pub mod constants;
pub mod error;
pub mod mint;
pub mod store;

pub use config::CoreConfig;
pub use error::{StoreError, StoreResult};
pub use mint::{mint, MintBatch, MintStats};
pub use store::{Identifier, IdentifierRecord, IdentifierSet, IdentifierStore};

// Re-exported so downstream crates don't need to depend on the leaf crates
// directly for the common vocabulary.
pub use idmint_barcode::Barcode;
pub use idmint_types::{IdentifierUse, SetName};
