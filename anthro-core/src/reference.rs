//! Reference table store
//!
//! Growth-reference LMS tables keyed by (indicator, sex). Tables come from a
//! [`TableSource`] and are cached in a [`ReferenceStore`] for the life of the
//! process.
//!
//! Global invariants enforced:
//! - A cached table is never mutated or reloaded
//! - Concurrent first loads of one table run the source once
//! - A failed load is cached too: the source is asked at most once per pair

use crate::domain::{AgeUnit, Indicator, Sex};
use crate::error::TableError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// One row of a growth reference table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub age_value: f64,
    pub age_unit: AgeUnit,
    #[serde(alias = "L")]
    pub l: f64,
    #[serde(alias = "M")]
    pub m: f64,
    #[serde(alias = "S")]
    pub s: f64,
}

impl ReferenceRow {
    pub fn new(age_value: f64, age_unit: AgeUnit, l: f64, m: f64, s: f64) -> Self {
        ReferenceRow {
            age_value,
            age_unit,
            l,
            m,
            s,
        }
    }
}

/// Validated, age-ordered LMS table for one indicator and sex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceTable {
    indicator: Indicator,
    sex: Sex,
    unit: AgeUnit,
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    /// Build a table, checking the row invariants.
    ///
    /// Rows must be non-empty, share one age unit, be strictly increasing in
    /// age and carry finite L/M/S with `M > 0` and `S > 0`.
    pub fn new(
        indicator: Indicator,
        sex: Sex,
        rows: Vec<ReferenceRow>,
    ) -> Result<Self, TableError> {
        let invalid = |reason: String| TableError::InvalidTable {
            indicator,
            sex,
            reason,
        };

        let first = rows
            .first()
            .ok_or_else(|| invalid("table has no rows".to_string()))?;
        let unit = first.age_unit;

        for (i, row) in rows.iter().enumerate() {
            if row.age_unit != unit {
                return Err(invalid(format!(
                    "row {} uses age unit {} but the table uses {}",
                    i, row.age_unit, unit
                )));
            }
            if !row.age_value.is_finite() || row.age_value < 0.0 {
                return Err(invalid(format!("row {} has invalid age {}", i, row.age_value)));
            }
            if !row.l.is_finite() || !row.m.is_finite() || !row.s.is_finite() {
                return Err(invalid(format!("row {} has non-finite LMS values", i)));
            }
            if row.m <= 0.0 {
                return Err(invalid(format!("row {} has non-positive M {}", i, row.m)));
            }
            if row.s <= 0.0 {
                return Err(invalid(format!("row {} has non-positive S {}", i, row.s)));
            }
            if i > 0 && row.age_value <= rows[i - 1].age_value {
                return Err(invalid(format!(
                    "row {} age {} does not increase (previous {})",
                    i,
                    row.age_value,
                    rows[i - 1].age_value
                )));
            }
        }

        Ok(ReferenceTable {
            indicator,
            sex,
            unit,
            rows,
        })
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    /// Native age unit shared by every row.
    pub fn unit(&self) -> AgeUnit {
        self.unit
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn min_age(&self) -> f64 {
        self.rows[0].age_value
    }

    pub fn max_age(&self) -> f64 {
        self.rows[self.rows.len() - 1].age_value
    }
}

/// Upstream supplier of reference rows.
///
/// `Ok(None)` means the source has no table for the pair.
pub trait TableSource: Send + Sync {
    fn load_rows(
        &self,
        indicator: Indicator,
        sex: Sex,
    ) -> Result<Option<Vec<ReferenceRow>>, TableError>;
}

/// Table file contents: either `{"rows": [...]}` or a bare row array.
#[derive(Deserialize)]
#[serde(untagged)]
enum TableFile {
    Wrapped { rows: Vec<ReferenceRow> },
    Bare(Vec<ReferenceRow>),
}

/// Directory of JSON tables named `{indicator}_{sex}.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding the given table.
    pub fn table_path(&self, indicator: Indicator, sex: Sex) -> PathBuf {
        self.root
            .join(format!("{}_{}.json", indicator.as_str(), sex.as_str()))
    }
}

impl TableSource for DirectorySource {
    fn load_rows(
        &self,
        indicator: Indicator,
        sex: Sex,
    ) -> Result<Option<Vec<ReferenceRow>>, TableError> {
        let path = self.table_path(indicator, sex);
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source: Arc::new(source),
        })?;
        let file: TableFile =
            serde_json::from_str(&content).map_err(|source| TableError::Parse {
                path: path.display().to_string(),
                source: Arc::new(source),
            })?;

        Ok(Some(match file {
            TableFile::Wrapped { rows } | TableFile::Bare(rows) => rows,
        }))
    }
}

/// Tables registered in process.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<(Indicator, Sex), Vec<ReferenceRow>>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    pub fn insert(&mut self, indicator: Indicator, sex: Sex, rows: Vec<ReferenceRow>) {
        self.tables.insert((indicator, sex), rows);
    }

    pub fn with_table(
        mut self,
        indicator: Indicator,
        sex: Sex,
        rows: Vec<ReferenceRow>,
    ) -> Self {
        self.insert(indicator, sex, rows);
        self
    }
}

impl TableSource for MemorySource {
    fn load_rows(
        &self,
        indicator: Indicator,
        sex: Sex,
    ) -> Result<Option<Vec<ReferenceRow>>, TableError> {
        Ok(self.tables.get(&(indicator, sex)).cloned())
    }
}

type LoadOutcome = Result<Arc<ReferenceTable>, TableError>;

/// Cache slot for one (indicator, sex) pair.
#[derive(Default)]
struct Slot {
    outcome: OnceLock<LoadOutcome>,
    load_guard: Mutex<()>,
}

impl Slot {
    fn table(&self) -> Option<&Arc<ReferenceTable>> {
        self.outcome.get().and_then(|outcome| outcome.as_ref().ok())
    }
}

/// Lazily populated, read-only cache of reference tables.
pub struct ReferenceStore {
    source: Box<dyn TableSource>,
    slots: Vec<Slot>,
}

impl ReferenceStore {
    pub fn new(source: impl TableSource + 'static) -> Self {
        let slots = (0..Indicator::COUNT * Sex::all().len())
            .map(|_| Slot::default())
            .collect();
        ReferenceStore {
            source: Box::new(source),
            slots,
        }
    }

    /// Store backed by a directory of JSON tables.
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        ReferenceStore::new(DirectorySource::new(root))
    }

    fn slot(&self, indicator: Indicator, sex: Sex) -> &Slot {
        &self.slots[indicator.index() * Sex::all().len() + sex.index()]
    }

    /// Load (once) and return the table for the pair.
    ///
    /// The outcome is cached either way; a pair that failed keeps returning
    /// the same error without going back to the source.
    pub fn load(&self, indicator: Indicator, sex: Sex) -> Result<Arc<ReferenceTable>, TableError> {
        let slot = self.slot(indicator, sex);
        if let Some(outcome) = slot.outcome.get() {
            return outcome.clone();
        }

        // Single flight: the first caller loads, the rest wait and re-check.
        let _guard = slot
            .load_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(outcome) = slot.outcome.get() {
            return outcome.clone();
        }

        let outcome = self.read_table(indicator, sex);
        match &outcome {
            Ok(table) => debug!(
                "loaded reference table {} ({}): {} rows in {}s",
                indicator,
                sex,
                table.rows().len(),
                table.unit()
            ),
            Err(e) => warn!("reference table {} ({}) unavailable: {}", indicator, sex, e),
        }

        slot.outcome.get_or_init(|| outcome).clone()
    }

    fn read_table(&self, indicator: Indicator, sex: Sex) -> LoadOutcome {
        let rows = self
            .source
            .load_rows(indicator, sex)?
            .ok_or(TableError::DataNotFound { indicator, sex })?;
        Ok(Arc::new(ReferenceTable::new(indicator, sex, rows)?))
    }

    /// True when the table is cached and valid.
    pub fn is_loaded(&self, indicator: Indicator, sex: Sex) -> bool {
        self.slot(indicator, sex).table().is_some()
    }

    /// Load every table the source provides, returning the pairs that
    /// failed with their errors.
    pub fn preload(&self) -> Vec<(Indicator, Sex, TableError)> {
        let mut failures = Vec::new();
        for indicator in Indicator::all() {
            for sex in Sex::all() {
                if let Err(e) = self.load(*indicator, *sex) {
                    failures.push((*indicator, *sex, e));
                }
            }
        }
        failures
    }
}

impl std::fmt::Debug for ReferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loaded = self.slots.iter().filter(|s| s.table().is_some()).count();
        let failed = self
            .slots
            .iter()
            .filter(|s| matches!(s.outcome.get(), Some(Err(_))))
            .count();
        f.debug_struct("ReferenceStore")
            .field("loaded_tables", &loaded)
            .field("failed_tables", &failed)
            .finish()
    }
}

static GLOBAL_STORE: OnceLock<ReferenceStore> = OnceLock::new();

/// Install the process-wide store. Returns the store back if one is
/// already installed.
pub fn install_global_store(store: ReferenceStore) -> Result<(), ReferenceStore> {
    GLOBAL_STORE.set(store)
}

/// The process-wide store, if installed.
pub fn global_store() -> Option<&'static ReferenceStore> {
    GLOBAL_STORE.get()
}
