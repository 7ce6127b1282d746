use redb::{ReadTransaction, ReadableTable, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::tables::*;

const DB_FILE_NAME: &str = "album-reports.redb";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to open database: {0}")]
    Open(Box<redb::DatabaseError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Failed to encode record: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("Failed to decode record: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// redb errors are large; keep them boxed so Result<_, DatabaseError> stays small.
macro_rules! boxed_redb_error {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for DatabaseError {
                fn from(e: $source) -> Self {
                    DatabaseError::$variant(Box::new(e))
                }
            }
        )*
    };
}

boxed_redb_error! {
    redb::DatabaseError => Open,
    redb::TransactionError => Transaction,
    redb::TableError => Table,
    redb::StorageError => Storage,
    redb::CommitError => Commit,
}

/// Album catalogue, report layouts and preview cache in one redb file.
/// Clones share the same handle.
#[derive(Clone)]
pub struct Database {
    inner: Arc<redb::Database>,
}

impl Database {
    /// Open the database file in `data_dir`, creating the directory, the file and
    /// any missing tables.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let inner = redb::Database::create(data_dir.join(DB_FILE_NAME))?;

        let write_txn = inner.begin_write()?;
        write_txn.open_table(ALBUMS)?;
        write_txn.open_table(REPORT_DEFINITIONS)?;
        write_txn.open_table(REPORT_REQUESTS)?;
        write_txn.open_table(REPORT_REQUEST_FILES)?;
        write_txn.open_table(SEQUENCES)?;
        write_txn.commit()?;

        tracing::debug!(path = %data_dir.display(), "Opened database");
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub(crate) fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.inner.begin_read()?)
    }

    pub(crate) fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.inner.begin_write()?)
    }
}

/// Issue the next id of the named sequence within an open write transaction.
/// Ids start at 1 and are never reused.
pub(crate) fn next_id(write_txn: &WriteTransaction, sequence: &str) -> Result<u64, DatabaseError> {
    let mut table = write_txn.open_table(SEQUENCES)?;
    let next = table.get(sequence)?.map_or(0, |v| v.value()) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}
