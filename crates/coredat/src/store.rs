//! Read-only access to the ordered key-value stores of a data directory.
//!
//! Bitcoin Core keeps `blocks/index` and `indexes/txindex` in LevelDB. The decoders of this crate
//! only need point lookups and prefix scans, captured by [`KeyValueStore`].

use crate::{Error, Result};
use rocksdb::{DB, Direction, IteratorMode, Options};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A key and its value.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Minimal capability of an ordered key-value store.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, `None` if the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Lazily iterates over all entries whose key starts with `prefix`, in key order.
    fn iter_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> Box<dyn Iterator<Item = Result<KeyValue>> + 'a>;
}

/// RocksDB handle opened in read-only mode.
///
/// Bitcoin Core's LevelDB directories are assumed readable here, since RocksDB descends from the
/// LevelDB table and manifest format. The default test run only covers RocksDB-written stores.
/// An ignored test reads a real `blocks/index` given through `COREDAT_BLOCK_INDEX`.
///
/// The handle is released when dropped; [`RocksdbStore::close`] makes that explicit.
pub struct RocksdbStore {
    db: DB,
    path: PathBuf,
}

impl RocksdbStore {
    /// Opens the store at `path` for reading. Fails if the directory holds no database.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(false);

        let db = DB::open_for_read_only(&opts, path, false).map_err(|source| Error::OpenStore {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Opened store at {} in read-only mode", path.display());

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the underlying database handle.
    pub fn close(self) {
        tracing::debug!("Closing store at {}", self.path.display());
    }
}

impl KeyValueStore for RocksdbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?)
    }

    fn iter_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> Box<dyn Iterator<Item = Result<KeyValue>> + 'a> {
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward))
            .map(|item| {
                item.map(|(key, value)| (key.into_vec(), value.into_vec()))
                    .map_err(Error::from)
            })
            .take_while(move |item| match item {
                Ok((key, _)) => key.starts_with(prefix),
                Err(_) => true,
            });

        Box::new(iter)
    }
}

/// In-memory store, used for tests and for records assembled by hand.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<KeyValue> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = KeyValue>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn iter_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> Box<dyn Iterator<Item = Result<KeyValue>> + 'a> {
        let iter = self
            .entries
            .range(prefix.to_vec()..)
            .take_while(move |(key, _)| key.starts_with(prefix))
            .map(|(key, value)| Ok((key.clone(), value.clone())));

        Box::new(iter)
    }
}
