use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::error::FiscalError;

/// Persisted counter state for one `"<cnpj>_<series>"` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRecord {
    /// Last issued document number. Never decreases.
    pub last_number: u64,
    pub last_updated: DateTime<Utc>,
}

/// Durable key→counter mapping behind the sequencer.
///
/// `update` must be an atomic read-modify-write: concurrent callers — and,
/// for shared stores, concurrent processes — must observe it as a single
/// transaction. The closure receives the current counter (if any) and
/// returns the new value, or `None` to leave the record untouched.
pub trait SequenceStore: Send + Sync {
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<u64>) -> Option<u64>,
    ) -> Result<Option<u64>, FiscalError>;

    fn load(&self, key: &str) -> Result<Option<SequenceRecord>, FiscalError>;
}

/// In-memory store for tests and single-process callers that track
/// persistence elsewhere.
#[derive(Debug, Default)]
pub struct MemorySequenceStore {
    records: Mutex<HashMap<String, SequenceRecord>>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceStore for MemorySequenceStore {
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<u64>) -> Option<u64>,
    ) -> Result<Option<u64>, FiscalError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| FiscalError::Sequencing("sequence store lock poisoned".into()))?;
        let current = records.get(key).map(|r| r.last_number);
        match apply(current) {
            Some(new) => {
                records.insert(
                    key.to_string(),
                    SequenceRecord {
                        last_number: new,
                        last_updated: Utc::now(),
                    },
                );
                Ok(Some(new))
            }
            None => Ok(current),
        }
    }

    fn load(&self, key: &str) -> Result<Option<SequenceRecord>, FiscalError> {
        let records = self
            .records
            .lock()
            .map_err(|_| FiscalError::Sequencing("sequence store lock poisoned".into()))?;
        Ok(records.get(key).cloned())
    }
}

/// File-backed store: one JSON object mapping keys to [`SequenceRecord`]s.
///
/// Cross-process safety comes from an exclusive advisory lock held for the
/// whole read-modify-write; the in-process mutex only serializes threads
/// sharing this instance and is not a substitute for the file lock.
#[derive(Debug)]
pub struct FileSequenceStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileSequenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    fn with_locked_file<T>(
        &self,
        f: impl FnOnce(&mut std::fs::File, &mut HashMap<String, SequenceRecord>) -> Result<T, FiscalError>,
    ) -> Result<T, FiscalError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| FiscalError::Sequencing("sequence store lock poisoned".into()))?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| FiscalError::Sequencing(format!("open {:?}: {e}", self.path)))?;
        file.lock_exclusive()
            .map_err(|e| FiscalError::Sequencing(format!("lock {:?}: {e}", self.path)))?;

        let result = (|| {
            let mut raw = String::new();
            file.read_to_string(&mut raw)
                .map_err(|e| FiscalError::Sequencing(format!("read {:?}: {e}", self.path)))?;
            let mut records: HashMap<String, SequenceRecord> = if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw)
                    .map_err(|e| FiscalError::Sequencing(format!("parse {:?}: {e}", self.path)))?
            };
            f(&mut file, &mut records)
        })();

        let _ = fs2::FileExt::unlock(&file);
        result
    }

    fn persist(
        file: &mut std::fs::File,
        records: &HashMap<String, SequenceRecord>,
    ) -> Result<(), FiscalError> {
        let raw = serde_json::to_string_pretty(records)
            .map_err(|e| FiscalError::Sequencing(format!("serialize: {e}")))?;
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.set_len(0))
            .and_then(|_| file.write_all(raw.as_bytes()))
            .and_then(|_| file.sync_data())
            .map_err(|e| FiscalError::Sequencing(format!("write: {e}")))
    }
}

impl SequenceStore for FileSequenceStore {
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<u64>) -> Option<u64>,
    ) -> Result<Option<u64>, FiscalError> {
        self.with_locked_file(|file, records| {
            let current = records.get(key).map(|r| r.last_number);
            match apply(current) {
                Some(new) => {
                    records.insert(
                        key.to_string(),
                        SequenceRecord {
                            last_number: new,
                            last_updated: Utc::now(),
                        },
                    );
                    Self::persist(file, records)?;
                    Ok(Some(new))
                }
                None => Ok(current),
            }
        })
    }

    fn load(&self, key: &str) -> Result<Option<SequenceRecord>, FiscalError> {
        self.with_locked_file(|_, records| Ok(records.get(key).cloned()))
    }
}

/// Hands out the next document number per (issuer, series) pair.
///
/// Counters are monotonic: `next` atomically increments, `advance` only ever
/// raises. Concurrent `next` calls on the same key never return the same
/// number twice.
pub struct NumberSequencer<S: SequenceStore> {
    store: S,
}

impl<S: SequenceStore> NumberSequencer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn key(cnpj: &str, series: u16) -> String {
        format!("{cnpj}_{series}")
    }

    /// Atomically increment and return the counter; a fresh key starts at 1.
    pub fn next(&self, cnpj: &str, series: u16) -> Result<u64, FiscalError> {
        let mut issued = 0u64;
        self.store.update(&Self::key(cnpj, series), &mut |current| {
            issued = current.unwrap_or(0) + 1;
            Some(issued)
        })?;
        Ok(issued)
    }

    /// Raise the counter to `number` if that is an increase; lower or equal
    /// values are a no-op.
    pub fn advance(&self, cnpj: &str, series: u16, number: u64) -> Result<(), FiscalError> {
        self.store
            .update(&Self::key(cnpj, series), &mut |current| match current {
                Some(c) if c >= number => None,
                _ => Some(number),
            })?;
        Ok(())
    }

    /// Last issued number for the key, if any.
    pub fn current(&self, cnpj: &str, series: u16) -> Result<Option<u64>, FiscalError> {
        Ok(self
            .store
            .load(&Self::key(cnpj, series))?
            .map(|r| r.last_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CNPJ: &str = "11222333000181";

    #[test]
    fn fresh_key_starts_at_one() {
        let seq = NumberSequencer::new(MemorySequenceStore::new());
        assert_eq!(seq.next(CNPJ, 1).unwrap(), 1);
        assert_eq!(seq.next(CNPJ, 1).unwrap(), 2);
        assert_eq!(seq.next(CNPJ, 1).unwrap(), 3);
    }

    #[test]
    fn series_are_independent() {
        let seq = NumberSequencer::new(MemorySequenceStore::new());
        assert_eq!(seq.next(CNPJ, 1).unwrap(), 1);
        assert_eq!(seq.next(CNPJ, 2).unwrap(), 1);
        assert_eq!(seq.next(CNPJ, 1).unwrap(), 2);
    }

    #[test]
    fn advance_then_next() {
        let seq = NumberSequencer::new(MemorySequenceStore::new());
        seq.advance(CNPJ, 1, 100).unwrap();
        assert_eq!(seq.next(CNPJ, 1).unwrap(), 101);
    }

    #[test]
    fn advance_never_regresses() {
        let seq = NumberSequencer::new(MemorySequenceStore::new());
        seq.advance(CNPJ, 1, 100).unwrap();
        seq.advance(CNPJ, 1, 50).unwrap();
        assert_eq!(seq.current(CNPJ, 1).unwrap(), Some(100));
        seq.advance(CNPJ, 1, 100).unwrap();
        assert_eq!(seq.current(CNPJ, 1).unwrap(), Some(100));
    }

    #[test]
    fn current_is_none_for_fresh_key() {
        let seq = NumberSequencer::new(MemorySequenceStore::new());
        assert_eq!(seq.current(CNPJ, 9).unwrap(), None);
    }
}
