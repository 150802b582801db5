//! Batch minting orchestrator.
//!
//! Minting is a retry loop around the store's gated insert: draw a fresh
//! random UUID, derive its default barcode, attempt the insert, and treat a
//! gate rejection or exact collision as "this candidate collided, try
//! another". The caller sees either the full requested count of successes
//! (with the retry overhead reported in statistics) or an abrupt abort for
//! conditions no amount of fresh randomness can fix.

use crate::error::{StoreError, StoreResult};
use crate::store::{Identifier, IdentifierStore};
use idmint_types::SetName;
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Aggregate statistics for one batch-mint call.
///
/// The per-slot failure figures are the number of rejected candidates drawn
/// before each successful identifier; they are the operational signal for
/// how crowded the barcode space is becoming.
#[derive(Debug, Clone, Serialize)]
pub struct MintStats {
    pub requested: usize,
    pub retries: u64,
    pub elapsed_seconds: f64,
    pub mean_failures_per_slot: f64,
    pub median_failures_per_slot: f64,
    pub max_failures_per_slot: u32,
}

/// The result of a batch-mint call: the new identifiers, in mint order,
/// plus the batch statistics.
#[derive(Debug)]
pub struct MintBatch {
    pub identifiers: Vec<Identifier>,
    pub stats: MintStats,
}

/// Mints `count` new identifiers in the set `set_name`.
///
/// Candidate UUIDs come from `uuid_source`; production callers pass
/// `Uuid::new_v4` and tests pass a seeded generator. Each candidate goes
/// through the barcode-safety gate; retryable rejections (exclusion
/// violations, exact collisions) are counted and retried with a fresh
/// draw, up to the configured per-slot attempt ceiling.
///
/// # Errors
///
/// - `UnknownSet` if `set_name` doesn't exist (checked up front; never
///   retried)
/// - `MintExhausted` if a slot uses up the attempt ceiling without a
///   success
/// - any non-retryable store error, propagated immediately, aborting the
///   batch
pub fn mint(
    store: &IdentifierStore,
    set_name: &SetName,
    count: usize,
    mut uuid_source: impl FnMut() -> Uuid,
) -> StoreResult<MintBatch> {
    // A bad set name would never succeed; fail before drawing anything.
    store.set(set_name)?;

    let max_attempts = store.config().max_attempts_per_slot();
    let started = Instant::now();

    let mut identifiers = Vec::with_capacity(count);
    let mut slot_failures: Vec<u32> = Vec::with_capacity(count);

    for slot in 0..count {
        let mut minted = None;
        let mut failures: u32 = 0;

        for _attempt in 0..max_attempts {
            let uuid = uuid_source();
            match store.create_identifier(set_name, uuid, None) {
                Ok(identifier) => {
                    minted = Some(identifier);
                    break;
                }
                Err(error) if error.is_retryable() => {
                    failures += 1;
                    tracing::debug!(slot, %error, "candidate rejected, retrying");
                }
                Err(error) => return Err(error),
            }
        }

        let Some(identifier) = minted else {
            return Err(StoreError::MintExhausted {
                slot,
                attempts: max_attempts,
            });
        };
        identifiers.push(identifier);
        slot_failures.push(failures);
    }

    let elapsed = started.elapsed();
    let retries: u64 = slot_failures.iter().map(|&f| u64::from(f)).sum();

    let mut sorted = slot_failures.clone();
    sorted.sort_unstable();
    let stats = MintStats {
        requested: count,
        retries,
        elapsed_seconds: elapsed.as_secs_f64(),
        mean_failures_per_slot: mean(&slot_failures),
        median_failures_per_slot: median(&sorted),
        max_failures_per_slot: sorted.last().copied().unwrap_or(0),
    };

    if count > 0 {
        let per_identifier = stats.elapsed_seconds / count as f64;
        let per_second = count as f64 / stats.elapsed_seconds.max(f64::EPSILON);
        tracing::info!(
            "minted {} identifiers in {} tries ({} retries) over {:.3}s \
             ({:.4} s/identifier = {:.1} identifiers/s)",
            count,
            count as u64 + retries,
            retries,
            stats.elapsed_seconds,
            per_identifier,
            per_second,
        );
    }

    Ok(MintBatch { identifiers, stats })
}

fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}

/// Median of an already-sorted sample.
fn median(sorted: &[u32]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
    } else {
        f64::from(sorted[mid])
    }
}
