//! # redb-backed Resource Store
//!
//! A disk-backed resource store using the redb embedded database.
//!
//! One table maps each UID to its encoded graph (see `codec`). Writes made
//! inside a transaction are staged in memory and land in ONE redb write
//! transaction on `commit`, so a request is durable all at once or not at
//! all. Outside a transaction every write commits on its own.

use super::ResourceStore;
use super::codec::{triples_from_bytes, triples_to_bytes};
use crate::imr::TripleSet;
use crate::types::LdpError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Table for resources: UID -> encoded graph bytes
const RESOURCES: TableDefinition<&str, &[u8]> = TableDefinition::new("resources");

/// Staged writes of the open transaction. `None` marks a removal.
type Staged = BTreeMap<String, Option<TripleSet>>;

/// A disk-backed resource store using redb.
pub struct RedbStore {
    db: Database,
    staged: Option<Staged>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("staged", &self.staged.as_ref().map(BTreeMap::len))
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a repository database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LdpError> {
        let db = Database::create(path.as_ref()).map_err(|e| LdpError::Storage(e.to_string()))?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| LdpError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(RESOURCES)
                .map_err(|e| LdpError::Storage(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| LdpError::Storage(e.to_string()))?;
        }

        Ok(Self { db, staged: None })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), LdpError> {
        self.db
            .compact()
            .map_err(|e| LdpError::Storage(e.to_string()))?;
        Ok(())
    }

    fn read_committed(&self, uid: &str) -> Result<Option<TripleSet>, LdpError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| LdpError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(RESOURCES)
            .map_err(|e| LdpError::Storage(e.to_string()))?;
        match table
            .get(uid)
            .map_err(|e| LdpError::Storage(e.to_string()))?
        {
            Some(data) => Ok(Some(triples_from_bytes(data.value())?)),
            None => Ok(None),
        }
    }

    /// Write a batch of changes in a single ACID transaction.
    fn write_batch(&self, batch: Staged) -> Result<(), LdpError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| LdpError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(RESOURCES)
                .map_err(|e| LdpError::Storage(e.to_string()))?;
            for (uid, triples) in batch {
                match triples {
                    Some(triples) if !triples.is_empty() => {
                        let bytes = triples_to_bytes(&triples)?;
                        table
                            .insert(uid.as_str(), bytes.as_slice())
                            .map_err(|e| LdpError::Storage(e.to_string()))?;
                    }
                    _ => {
                        table
                            .remove(uid.as_str())
                            .map_err(|e| LdpError::Storage(e.to_string()))?;
                    }
                }
            }
        }
        write_txn
            .commit()
            .map_err(|e| LdpError::Storage(e.to_string()))?;
        Ok(())
    }

    fn stage(&mut self, uid: &str, triples: Option<TripleSet>) -> Result<(), LdpError> {
        match self.staged.as_mut() {
            Some(staged) => {
                staged.insert(uid.to_string(), triples);
                Ok(())
            }
            None => self.write_batch(BTreeMap::from([(uid.to_string(), triples)])),
        }
    }
}

impl ResourceStore for RedbStore {
    fn load(&self, uid: &str) -> Result<Option<TripleSet>, LdpError> {
        if let Some(staged) = self.staged.as_ref().and_then(|s| s.get(uid)) {
            return Ok(staged.clone().filter(|t| !t.is_empty()));
        }
        self.read_committed(uid)
    }

    fn save(&mut self, uid: &str, triples: TripleSet) -> Result<(), LdpError> {
        self.stage(uid, Some(triples))
    }

    fn purge(&mut self, uid: &str) -> Result<(), LdpError> {
        self.stage(uid, None)
    }

    fn uids(&self) -> Result<Vec<String>, LdpError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| LdpError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(RESOURCES)
            .map_err(|e| LdpError::Storage(e.to_string()))?;

        let mut uids = BTreeSet::new();
        for entry in table.iter().map_err(|e| LdpError::Storage(e.to_string()))? {
            let (key, _) = entry.map_err(|e| LdpError::Storage(e.to_string()))?;
            uids.insert(key.value().to_string());
        }
        if let Some(staged) = &self.staged {
            for (uid, triples) in staged {
                match triples {
                    Some(t) if !t.is_empty() => uids.insert(uid.clone()),
                    _ => uids.remove(uid),
                };
            }
        }
        Ok(uids.into_iter().collect())
    }

    fn begin(&mut self) -> Result<(), LdpError> {
        if self.staged.is_some() {
            return Err(LdpError::Storage("transaction already open".to_string()));
        }
        self.staged = Some(Staged::new());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), LdpError> {
        match self.staged.take() {
            Some(batch) if !batch.is_empty() => self.write_batch(batch),
            _ => Ok(()),
        }
    }

    fn rollback(&mut self) -> Result<(), LdpError> {
        self.staged = None;
        Ok(())
    }
}
