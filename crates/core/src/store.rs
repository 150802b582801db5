//! The identifier record store and its barcode-safety gate.
//!
//! This module owns the one shared mutable resource in the system: the
//! population of minted identifiers. Every insert or barcode correction
//! runs the safety gate — the check that no two live barcodes are closer
//! than the configured minimum substitution distance — inside a single
//! exclusive critical section over the whole population, because the
//! invariant is population-wide and a per-row check against a stale
//! snapshot could let two concurrent writers violate it together.
//!
//! ## Storage layout
//!
//! Identifiers are stored as one JSON document each in a sharded structure:
//!
//! ```text
//! <data_dir>/
//!   sets.json                 # identifier set registry
//!   identifiers/
//!     <s1>/
//!       <s2>/
//!         <uuid>.json         # one minted identifier
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the UUID,
//! keeping directory fan-out bounded as the population grows into the
//! millions. The full population (and the slice inverted index that
//! accelerates the gate) is loaded into memory at open; files are written
//! inside the same critical section that updates the in-memory indexes, so
//! the cached `slices` projection can never go stale.

use crate::config::CoreConfig;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use idmint_barcode::{bounded_distance, slices, Barcode};
use idmint_types::{IdentifierUse, SetName};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// A named, typed pool of identifiers.
///
/// Sets group identifiers by the kind of thing they will label. The name is
/// unique; the numeric id is stable once assigned and referenced by every
/// identifier minted into the set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierSet {
    pub id: u32,
    pub name: SetName,
    #[serde(rename = "use")]
    pub use_kind: IdentifierUse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One minted identifier, as persisted.
///
/// The UUID is the durable identity and never changes; the barcode may be
/// corrected later. `slices` is a cached projection of the barcode and is
/// recomputed whenever the barcode is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    pub uuid: Uuid,
    pub barcode: Barcode,
    pub slices: Option<Vec<String>>,
    pub set_id: u32,
    pub generated: DateTime<Utc>,
}

/// A lookup result: an identifier joined with its owning set.
#[derive(Debug, Clone, Serialize)]
pub struct IdentifierRecord {
    pub uuid: Uuid,
    pub barcode: Barcode,
    pub generated: DateTime<Utc>,
    pub set_name: SetName,
    pub set_use: IdentifierUse,
}

/// In-memory view of the minted population, kept exactly consistent with
/// the files on disk by only ever being mutated inside the store's write
/// lock, after the corresponding file write has succeeded.
#[derive(Default)]
struct Population {
    records: HashMap<Uuid, Identifier>,
    /// Canonical (lowercase) barcode → owning UUID. Doubles as the
    /// case-insensitive uniqueness index.
    by_barcode: HashMap<String, Uuid>,
    /// Inverted slice index: slice value → identifiers containing it. This
    /// is the pre-filter that keeps the gate from scanning the whole
    /// population per candidate.
    by_slice: HashMap<String, HashSet<Uuid>>,
}

impl Population {
    fn index(&mut self, identifier: Identifier) {
        if let Some(identifier_slices) = slices(identifier.barcode.as_str()) {
            for slice in identifier_slices {
                self.by_slice
                    .entry(slice)
                    .or_default()
                    .insert(identifier.uuid);
            }
        }
        self.by_barcode
            .insert(identifier.barcode.as_str().to_string(), identifier.uuid);
        self.records.insert(identifier.uuid, identifier);
    }

    fn unindex(&mut self, identifier: &Identifier) {
        if let Some(identifier_slices) = slices(identifier.barcode.as_str()) {
            for slice in identifier_slices {
                if let Some(members) = self.by_slice.get_mut(&slice) {
                    members.remove(&identifier.uuid);
                    if members.is_empty() {
                        self.by_slice.remove(&slice);
                    }
                }
            }
        }
        self.by_barcode.remove(identifier.barcode.as_str());
        self.records.remove(&identifier.uuid);
    }

    /// The barcode-safety gate's distance check.
    ///
    /// Pre-filters the population to identifiers sharing at least one slice
    /// with the candidate, then runs the exact short-circuiting distance
    /// against only those survivors. The pigeonhole argument guarantees the
    /// pre-filtered set contains every barcode closer than the minimum
    /// distance because `CoreConfig` caps the minimum at
    /// `MAX_MINIMUM_DISTANCE`, the bound the slice width supports.
    /// `exclude` removes a row's own prior value from the conflict set when
    /// validating a correction.
    fn check_min_distance(
        &self,
        candidate: &Barcode,
        exclude: Option<Uuid>,
        minimum_distance: usize,
    ) -> StoreResult<()> {
        let Some(candidate_slices) = slices(candidate.as_str()) else {
            return Ok(());
        };

        let mut nearby: HashSet<Uuid> = HashSet::new();
        for slice in &candidate_slices {
            if let Some(members) = self.by_slice.get(slice) {
                nearby.extend(members);
            }
        }
        if let Some(own) = exclude {
            nearby.remove(&own);
        }

        for uuid in nearby {
            // Indexes and records are updated together; a member of the
            // slice index is always present in `records`.
            let Some(existing) = self.records.get(&uuid) else {
                continue;
            };
            let distance = bounded_distance(
                candidate.as_str(),
                existing.barcode.as_str(),
                minimum_distance - 1,
            )?;
            if distance < minimum_distance {
                return Err(StoreError::ExclusionViolation {
                    barcode: candidate.clone(),
                    minimum_distance,
                    conflict: existing.barcode.clone(),
                });
            }
        }

        Ok(())
    }
}

struct Inner {
    sets: Vec<IdentifierSet>,
    population: Population,
}

impl Inner {
    fn set_by_name(&self, name: &SetName) -> StoreResult<&IdentifierSet> {
        self.sets
            .iter()
            .find(|s| s.name == *name)
            .ok_or_else(|| StoreError::UnknownSet(name.to_string()))
    }

    fn set_by_id(&self, id: u32) -> StoreResult<&IdentifierSet> {
        self.sets
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::UnknownSet(format!("id {id}")))
    }
}

/// The durable store of identifier sets and minted identifiers.
///
/// All writes are serialized through one exclusive lock spanning the whole
/// population; this is a deliberate throughput/safety tradeoff — the
/// minimum-distance invariant cannot be enforced per row under concurrent
/// writers. Reads take a shared lock and are never blocked by each other.
pub struct IdentifierStore {
    cfg: Arc<CoreConfig>,
    inner: RwLock<Inner>,
}

impl IdentifierStore {
    /// Opens (creating if necessary) the store under the configured data
    /// directory, loading the set registry and the full identifier
    /// population and rebuilding the slice index.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the storage directories cannot be created or
    /// any persisted document cannot be read or parsed. A partially
    /// readable population is an error, not a warning: the safety gate is
    /// only sound against the complete population.
    pub fn open(cfg: Arc<CoreConfig>) -> StoreResult<Self> {
        fs::create_dir_all(cfg.identifiers_dir()).map_err(StoreError::StorageDirCreation)?;

        let sets = load_sets(&cfg)?;
        let population = load_population(&cfg)?;

        tracing::info!(
            sets = sets.len(),
            identifiers = population.records.len(),
            data_dir = %cfg.data_dir().display(),
            "opened identifier store"
        );

        Ok(Self {
            cfg,
            inner: RwLock::new(Inner { sets, population }),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    fn read_inner(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write_inner(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Creates the identifier set `name` if it doesn't already exist.
    ///
    /// If the set exists, its use and (when provided) description are
    /// updated instead; the stable numeric id is never reassigned. Returns
    /// the set and whether it was newly created.
    pub fn create_set(
        &self,
        name: &SetName,
        use_kind: IdentifierUse,
        description: Option<String>,
    ) -> StoreResult<(IdentifierSet, bool)> {
        let description = description.filter(|d| !d.trim().is_empty());
        let mut inner = self.write_inner()?;

        if let Some(pos) = inner.sets.iter().position(|s| s.name == *name) {
            inner.sets[pos].use_kind = use_kind;
            if description.is_some() {
                inner.sets[pos].description = description;
            }
            let set = inner.sets[pos].clone();
            persist_sets(&self.cfg, &inner.sets)?;
            tracing::info!(set = %set.name, "updated existing identifier set");
            return Ok((set, false));
        }

        let id = inner.sets.iter().map(|s| s.id).max().map_or(1, |m| m + 1);
        let set = IdentifierSet {
            id,
            name: name.clone(),
            use_kind,
            description,
        };
        inner.sets.push(set.clone());
        persist_sets(&self.cfg, &inner.sets)?;
        tracing::info!(set = %set.name, set_use = %set.use_kind, "created identifier set");
        Ok((set, true))
    }

    /// Returns all identifier sets.
    pub fn sets(&self) -> StoreResult<Vec<IdentifierSet>> {
        Ok(self.read_inner()?.sets.clone())
    }

    /// Looks up one identifier set by name.
    pub fn set(&self, name: &SetName) -> StoreResult<IdentifierSet> {
        Ok(self.read_inner()?.set_by_name(name)?.clone())
    }

    /// Inserts a new identifier into `set_name`, subject to the
    /// barcode-safety gate.
    ///
    /// The barcode auto-derives from the UUID when not supplied. The
    /// uniqueness checks, the distance gate, the file write, and the index
    /// updates all happen inside one exclusive lock acquisition, so
    /// concurrent writers are strictly serialized against the same current
    /// population.
    ///
    /// # Errors
    ///
    /// - `UuidTaken` / `BarcodeTaken` on exact collisions (retryable)
    /// - `ExclusionViolation` if any existing barcode is within the
    ///   minimum distance (retryable)
    /// - `UnknownSet` and storage errors (not retryable)
    pub fn create_identifier(
        &self,
        set_name: &SetName,
        uuid: Uuid,
        barcode: Option<Barcode>,
    ) -> StoreResult<Identifier> {
        let mut inner = self.write_inner()?;
        let set_id = inner.set_by_name(set_name)?.id;
        let barcode = barcode.unwrap_or_else(|| Barcode::from_uuid(&uuid));

        if inner.population.records.contains_key(&uuid) {
            return Err(StoreError::UuidTaken(uuid));
        }
        if inner.population.by_barcode.contains_key(barcode.as_str()) {
            return Err(StoreError::BarcodeTaken(barcode));
        }
        inner
            .population
            .check_min_distance(&barcode, None, self.cfg.minimum_distance())?;

        let identifier = Identifier {
            uuid,
            slices: slices(barcode.as_str()),
            barcode,
            set_id,
            generated: Utc::now(),
        };
        persist_identifier(&self.cfg, &identifier)?;
        inner.population.index(identifier.clone());

        tracing::debug!(uuid = %identifier.uuid, barcode = %identifier.barcode, "minted identifier");
        Ok(identifier)
    }

    /// Updates the barcode of an existing identifier, subject to the same
    /// gate as inserts but with the row's own previous value excluded from
    /// the conflict set — a correction is allowed to be unchanged or to
    /// remain exactly where it was.
    pub fn correct_barcode(&self, uuid: &Uuid, new_barcode: Barcode) -> StoreResult<Identifier> {
        let mut inner = self.write_inner()?;
        let prior = inner
            .population
            .records
            .get(uuid)
            .cloned()
            .ok_or_else(|| StoreError::UnknownIdentifier(uuid.to_string()))?;

        if let Some(&owner) = inner.population.by_barcode.get(new_barcode.as_str()) {
            if owner != *uuid {
                return Err(StoreError::BarcodeTaken(new_barcode));
            }
        }
        inner
            .population
            .check_min_distance(&new_barcode, Some(*uuid), self.cfg.minimum_distance())?;

        let updated = Identifier {
            slices: slices(new_barcode.as_str()),
            barcode: new_barcode,
            ..prior.clone()
        };
        persist_identifier(&self.cfg, &updated)?;
        inner.population.unindex(&prior);
        inner.population.index(updated.clone());

        tracing::info!(
            uuid = %updated.uuid,
            from = %prior.barcode,
            to = %updated.barcode,
            "corrected barcode"
        );
        Ok(updated)
    }

    /// Resolves an identifier by full UUID or by barcode.
    ///
    /// A pure read: takes only the shared lock and is never blocked by
    /// other readers.
    pub fn lookup(&self, id: &str) -> StoreResult<IdentifierRecord> {
        let inner = self.read_inner()?;

        // Anything that isn't a UUID is treated as a barcode; input that
        // cannot even be a barcode simply resolves to nothing.
        let identifier = match Uuid::parse_str(id.trim()) {
            Ok(uuid) => inner.population.records.get(&uuid),
            Err(_) => Barcode::parse(id).ok().and_then(|barcode| {
                inner
                    .population
                    .by_barcode
                    .get(barcode.as_str())
                    .and_then(|uuid| inner.population.records.get(uuid))
            }),
        };

        let Some(identifier) = identifier else {
            tracing::warn!(id, "no identifier found");
            return Err(StoreError::UnknownIdentifier(id.to_string()));
        };
        let set = inner.set_by_id(identifier.set_id)?;

        tracing::debug!(set = %set.name, uuid = %identifier.uuid, "found identifier");
        Ok(IdentifierRecord {
            uuid: identifier.uuid,
            barcode: identifier.barcode.clone(),
            generated: identifier.generated,
            set_name: set.name.clone(),
            set_use: set.use_kind,
        })
    }
}

/// Returns `identifiers/<s1>/<s2>/<uuid>.json` for a UUID, where `s1`/`s2`
/// are its first four simple-form hex characters.
fn identifier_path(cfg: &CoreConfig, uuid: &Uuid) -> PathBuf {
    let simple = uuid.simple().to_string();
    cfg.identifiers_dir()
        .join(&simple[0..2])
        .join(&simple[2..4])
        .join(format!("{simple}.json"))
}

fn persist_identifier(cfg: &CoreConfig, identifier: &Identifier) -> StoreResult<()> {
    let path = identifier_path(cfg, &identifier.uuid);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(StoreError::StorageDirCreation)?;
    }
    let json = serde_json::to_string_pretty(identifier).map_err(StoreError::Serialization)?;
    fs::write(&path, json).map_err(StoreError::FileWrite)
}

fn persist_sets(cfg: &CoreConfig, sets: &[IdentifierSet]) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(sets).map_err(StoreError::Serialization)?;
    fs::write(cfg.sets_file(), json).map_err(StoreError::FileWrite)
}

fn load_sets(cfg: &CoreConfig) -> StoreResult<Vec<IdentifierSet>> {
    let path = cfg.sets_file();
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(&path).map_err(StoreError::FileRead)?;
    serde_json::from_str(&contents).map_err(StoreError::Deserialization)
}

/// Walks the two shard levels under `identifiers/` and indexes every
/// persisted identifier document.
fn load_population(cfg: &CoreConfig) -> StoreResult<Population> {
    let mut population = Population::default();

    let root = cfg.identifiers_dir();
    for s1 in fs::read_dir(&root).map_err(StoreError::FileRead)? {
        let s1_path = s1.map_err(StoreError::FileRead)?.path();
        if !s1_path.is_dir() {
            continue;
        }

        for s2 in fs::read_dir(&s1_path).map_err(StoreError::FileRead)? {
            let s2_path = s2.map_err(StoreError::FileRead)?.path();
            if !s2_path.is_dir() {
                continue;
            }

            for entry in fs::read_dir(&s2_path).map_err(StoreError::FileRead)? {
                let path = entry.map_err(StoreError::FileRead)?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }

                let contents = fs::read_to_string(&path).map_err(StoreError::FileRead)?;
                let identifier: Identifier =
                    serde_json::from_str(&contents).map_err(StoreError::Deserialization)?;
                population.index(identifier);
            }
        }
    }

    Ok(population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MAX_ATTEMPTS_PER_SLOT;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> IdentifierStore {
        let cfg = Arc::new(
            CoreConfig::new(dir.path().to_path_buf(), 3, DEFAULT_MAX_ATTEMPTS_PER_SLOT).unwrap(),
        );
        IdentifierStore::open(cfg).unwrap()
    }

    fn samples_set(store: &IdentifierStore) -> SetName {
        let name = SetName::new("samples").unwrap();
        store
            .create_set(&name, IdentifierUse::Sample, None)
            .unwrap();
        name
    }

    fn barcode(s: &str) -> Barcode {
        Barcode::parse(s).unwrap()
    }

    #[test]
    fn test_create_set_and_list() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let name = SetName::new("collections").unwrap();
        let (set, created) = store
            .create_set(&name, IdentifierUse::Collection, Some("swab tubes".into()))
            .unwrap();
        assert!(created);
        assert_eq!(set.id, 1);
        assert_eq!(set.description.as_deref(), Some("swab tubes"));

        let sets = store.sets().unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, name);
    }

    #[test]
    fn test_create_set_is_an_upsert() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let name = samples_set(&store);

        let (set, created) = store
            .create_set(&name, IdentifierUse::Sample, Some("aliquots".into()))
            .unwrap();
        assert!(!created);
        assert_eq!(set.id, 1);
        assert_eq!(set.description.as_deref(), Some("aliquots"));

        // An empty description is treated as absent, not as "".
        let (set, _) = store
            .create_set(&name, IdentifierUse::Sample, Some("  ".into()))
            .unwrap();
        assert_eq!(set.description.as_deref(), Some("aliquots"));
    }

    #[test]
    fn test_unknown_set_rejected() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let result =
            store.create_identifier(&SetName::new("nope").unwrap(), Uuid::new_v4(), None);
        assert!(matches!(result, Err(StoreError::UnknownSet(_))));
    }

    #[test]
    fn test_default_barcode_derives_from_uuid() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let set = samples_set(&store);

        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let identifier = store.create_identifier(&set, uuid, None).unwrap();
        assert_eq!(identifier.barcode.as_str(), "44665544");
        assert_eq!(
            identifier.slices,
            slices("44665544"),
            "cached slices must match the barcode"
        );
    }

    #[test]
    fn test_gate_rejects_within_minimum_distance() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let set = samples_set(&store);

        store
            .create_identifier(&set, Uuid::new_v4(), Some(barcode("00000000")))
            .unwrap();

        // distance 2 < 3: rejected with the conflicting example attached
        match store.create_identifier(&set, Uuid::new_v4(), Some(barcode("00000012"))) {
            Err(StoreError::ExclusionViolation {
                barcode: rejected,
                minimum_distance,
                conflict,
            }) => {
                assert_eq!(rejected.as_str(), "00000012");
                assert_eq!(minimum_distance, 3);
                assert_eq!(conflict.as_str(), "00000000");
            }
            other => panic!("expected ExclusionViolation, got {:?}", other),
        }

        // distance exactly 3: allowed
        store
            .create_identifier(&set, Uuid::new_v4(), Some(barcode("00000123")))
            .unwrap();
    }

    #[test]
    fn test_gate_honours_configured_minimum_distance() {
        let dir = TempDir::new().unwrap();
        let cfg = Arc::new(
            CoreConfig::new(dir.path().to_path_buf(), 4, DEFAULT_MAX_ATTEMPTS_PER_SLOT).unwrap(),
        );
        let store = IdentifierStore::open(cfg).unwrap();
        let set = samples_set(&store);

        store
            .create_identifier(&set, Uuid::new_v4(), Some(barcode("00000000")))
            .unwrap();

        // Distance 3, substitutions spread out to destroy as many aligned
        // windows as possible; minimum distance 4 must still reject it.
        match store.create_identifier(&set, Uuid::new_v4(), Some(barcode("0a00b0c0"))) {
            Err(StoreError::ExclusionViolation {
                minimum_distance, ..
            }) => assert_eq!(minimum_distance, 4),
            other => panic!("expected ExclusionViolation, got {:?}", other),
        }

        // Distance exactly 4: allowed.
        store
            .create_identifier(&set, Uuid::new_v4(), Some(barcode("0a0b0c0d")))
            .unwrap();
    }

    #[test]
    fn test_gate_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let set = samples_set(&store);

        store
            .create_identifier(&set, Uuid::new_v4(), Some(barcode("abcdefgh")))
            .unwrap();

        // Same value modulo case parses to the same canonical barcode.
        let result = store.create_identifier(&set, Uuid::new_v4(), Some(barcode("ABCDEFGH")));
        assert!(matches!(result, Err(StoreError::BarcodeTaken(_))));

        // One substitution away, in the other case: still too close.
        let result = store.create_identifier(&set, Uuid::new_v4(), Some(barcode("ABCDEFGX")));
        assert!(matches!(result, Err(StoreError::ExclusionViolation { .. })));
    }

    #[test]
    fn test_exact_collisions_are_distinct_from_exclusion() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let set = samples_set(&store);

        let uuid = Uuid::new_v4();
        store
            .create_identifier(&set, uuid, Some(barcode("00000000")))
            .unwrap();

        let result = store.create_identifier(&set, uuid, Some(barcode("11111111")));
        assert!(matches!(result, Err(StoreError::UuidTaken(_))));

        let result = store.create_identifier(&set, Uuid::new_v4(), Some(barcode("00000000")));
        assert!(matches!(result, Err(StoreError::BarcodeTaken(_))));
    }

    #[test]
    fn test_correction_to_own_value_succeeds() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let set = samples_set(&store);

        let uuid = Uuid::new_v4();
        store
            .create_identifier(&set, uuid, Some(barcode("00000000")))
            .unwrap();

        // "Close to itself" is fine: the prior value is excluded from the
        // conflict set.
        let updated = store.correct_barcode(&uuid, barcode("00000000")).unwrap();
        assert_eq!(updated.barcode.as_str(), "00000000");
    }

    #[test]
    fn test_correction_still_gated_against_others() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let set = samples_set(&store);

        let uuid = Uuid::new_v4();
        store
            .create_identifier(&set, uuid, Some(barcode("00000000")))
            .unwrap();
        store
            .create_identifier(&set, Uuid::new_v4(), Some(barcode("11111111")))
            .unwrap();

        let result = store.correct_barcode(&uuid, barcode("11111122"));
        assert!(matches!(result, Err(StoreError::ExclusionViolation { .. })));

        // A far-enough correction goes through and reindexes.
        let updated = store.correct_barcode(&uuid, barcode("22222222")).unwrap();
        assert_eq!(updated.barcode.as_str(), "22222222");
        assert_eq!(updated.uuid, uuid, "uuid is immutable across corrections");

        let found = store.lookup("22222222").unwrap();
        assert_eq!(found.uuid, uuid);
        assert!(matches!(
            store.lookup("00000000"),
            Err(StoreError::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn test_correction_of_unknown_identifier() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        samples_set(&store);

        let result = store.correct_barcode(&Uuid::new_v4(), barcode("00000000"));
        assert!(matches!(result, Err(StoreError::UnknownIdentifier(_))));
    }

    #[test]
    fn test_lookup_by_uuid_and_barcode() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let set = samples_set(&store);

        let uuid = Uuid::new_v4();
        let identifier = store
            .create_identifier(&set, uuid, Some(barcode("a1b2c3d4")))
            .unwrap();

        let by_uuid = store.lookup(&uuid.to_string()).unwrap();
        assert_eq!(by_uuid.barcode, identifier.barcode);
        assert_eq!(by_uuid.set_name.as_str(), "samples");
        assert_eq!(by_uuid.set_use, IdentifierUse::Sample);

        // Barcode lookups tolerate case drift from input devices.
        let by_barcode = store.lookup("A1B2C3D4").unwrap();
        assert_eq!(by_barcode.uuid, uuid);
    }

    #[test]
    fn test_lookup_of_malformed_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        samples_set(&store);

        // Neither a UUID nor a plausible barcode: resolves to nothing
        // rather than failing on the input itself.
        assert!(matches!(
            store.lookup("0000000"),
            Err(StoreError::UnknownIdentifier(_))
        ));
        assert!(matches!(
            store.lookup("not-a-barcode!"),
            Err(StoreError::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn test_population_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let uuid = Uuid::new_v4();

        {
            let store = test_store(&dir);
            let set = samples_set(&store);
            store
                .create_identifier(&set, uuid, Some(barcode("00000000")))
                .unwrap();
        }

        let store = test_store(&dir);
        let found = store.lookup("00000000").unwrap();
        assert_eq!(found.uuid, uuid);

        // The slice index was rebuilt: the gate still sees the old
        // population.
        let set = SetName::new("samples").unwrap();
        let result = store.create_identifier(&set, Uuid::new_v4(), Some(barcode("00000012")));
        assert!(matches!(result, Err(StoreError::ExclusionViolation { .. })));
    }

    #[test]
    fn test_concurrent_minting_preserves_invariant() {
        use idmint_barcode::substitution_distance_ci;
        use std::sync::Arc;

        let dir = TempDir::new().unwrap();
        let store = Arc::new(test_store(&dir));
        let set = samples_set(&store);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            let set = set.clone();
            handles.push(std::thread::spawn(move || {
                let mut minted = Vec::new();
                let mut produced = 0;
                while produced < 15 {
                    match store.create_identifier(&set, Uuid::new_v4(), None) {
                        Ok(identifier) => {
                            minted.push(identifier.barcode);
                            produced += 1;
                        }
                        Err(e) if e.is_retryable() => continue,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                minted
            }));
        }

        let mut all: Vec<Barcode> = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        assert_eq!(all.len(), 60);

        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                let d = substitution_distance_ci(all[i].as_str(), all[j].as_str()).unwrap();
                assert!(d >= 3, "{} and {} are only {} apart", all[i], all[j], d);
            }
        }
    }
}
