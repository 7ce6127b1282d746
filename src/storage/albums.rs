use redb::ReadableTable;

use super::db::{next_id, Database, DatabaseError};
use super::models::{Album, AlbumValues};
use super::tables::*;

impl Database {
    // ========================================================================
    // Album operations
    // ========================================================================

    /// Insert a new album and return it with its assigned id
    pub fn insert_album(&self, values: AlbumValues) -> Result<Album, DatabaseError> {
        let write_txn = self.begin_write()?;
        let album = {
            let id = next_id(&write_txn, "albums")?;
            let album = values.into_album(id);

            let mut table = write_txn.open_table(ALBUMS)?;
            let data = rmp_serde::to_vec_named(&album)?;
            table.insert(id, data.as_slice())?;
            album
        };
        write_txn.commit()?;
        Ok(album)
    }

    /// Replace the fields of an existing album. Returns false if no album has this id.
    pub fn update_album(&self, id: u64, values: AlbumValues) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(ALBUMS)?;
            let exists = table.get(id)?.is_some();
            if exists {
                let data = rmp_serde::to_vec_named(&values.into_album(id))?;
                table.insert(id, data.as_slice())?;
            }
            exists
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Get an album by its id
    pub fn get_album(&self, id: u64) -> Result<Option<Album>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ALBUMS)?;

        match table.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// List albums ordered by name, optionally restricted to a single year
    pub fn list_albums(&self, year: Option<i32>) -> Result<Vec<Album>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ALBUMS)?;

        let mut albums = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let album: Album = rmp_serde::from_slice(value.value())?;
            if year.is_none() || album.year == year {
                albums.push(album);
            }
        }

        albums.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(albums)
    }
}
