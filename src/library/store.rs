// SQLite-backed song library

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

use super::models::Song;
use crate::error::Result;

const SCHEMA_VERSION: i32 = 2;

pub struct SongStore {
    conn: Connection,
}

impl SongStore {
    /// Open (or create) the library at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("Opening song library at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version >= SCHEMA_VERSION {
            return Ok(());
        }

        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS songs (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                artist TEXT NOT NULL DEFAULT '',
                album TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                filename TEXT NOT NULL DEFAULT ''
            );",
        )?;
        self.conn
            .execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
        Ok(())
    }

    fn song_from_row(row: &Row<'_>) -> rusqlite::Result<Song> {
        Ok(Song {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: row.get(2)?,
            album: row.get(3)?,
            url: row.get(4)?,
            filename: row.get(5)?,
        })
    }

    /// Whether a song with this id has already been indexed
    pub fn contains(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM songs WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert or replace a song by id
    pub fn put(&self, song: &Song) -> Result<()> {
        self.conn.execute(
            "INSERT INTO songs (id, title, artist, album, url, filename)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                artist = excluded.artist,
                album = excluded.album,
                url = excluded.url,
                filename = excluded.filename",
            params![song.id, song.title, song.artist, song.album, song.url, song.filename],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Song>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, title, artist, album, url, filename FROM songs WHERE id = ?1",
                params![id],
                Self::song_from_row,
            )
            .optional()?)
    }

    /// Every song, ordered for display
    pub fn all(&self) -> Result<Vec<Song>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, artist, album, url, filename FROM songs
             ORDER BY artist COLLATE NOCASE, album COLLATE NOCASE, title COLLATE NOCASE, id",
        )?;
        let songs = stmt
            .query_map([], Self::song_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(songs)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM songs WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM songs", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, title: &str, artist: &str, album: &str) -> Song {
        Song {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            url: format!("https://drive.example/{}", id),
            filename: format!("{}.mp3", title),
        }
    }

    #[test]
    fn test_put_then_contains() {
        let store = SongStore::open_in_memory().unwrap();
        assert!(!store.contains("a").unwrap());
        store.put(&song("a", "Title", "Artist", "Album")).unwrap();
        assert!(store.contains("a").unwrap());
        assert_eq!(store.get("a").unwrap().unwrap().title, "Title");
        assert!(store.get("b").unwrap().is_none());
    }

    #[test]
    fn test_put_is_an_upsert() {
        let store = SongStore::open_in_memory().unwrap();
        store.put(&song("a", "Old", "Artist", "Album")).unwrap();
        store.put(&song("a", "New", "Artist", "Album")).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("a").unwrap().unwrap().title, "New");
    }

    #[test]
    fn test_all_is_ordered_for_display() {
        let store = SongStore::open_in_memory().unwrap();
        store.put(&song("1", "Zebra", "beta", "One")).unwrap();
        store.put(&song("2", "Apple", "Alpha", "Two")).unwrap();
        store.put(&song("3", "Mango", "alpha", "One")).unwrap();

        let titles: Vec<String> = store.all().unwrap().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Mango", "Apple", "Zebra"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = SongStore::open_in_memory().unwrap();
        store.put(&song("a", "A", "", "")).unwrap();
        store.put(&song("b", "B", "", "")).unwrap();
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.clear().unwrap(), 1);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_reopen_file_keeps_songs() {
        let path = std::env::temp_dir()
            .join(format!("drivetunes-store-{}", std::process::id()))
            .join("songs.db");
        {
            let store = SongStore::open(&path).unwrap();
            store.put(&song("a", "Kept", "", "")).unwrap();
        }
        let store = SongStore::open(&path).unwrap();
        assert_eq!(store.get("a").unwrap().unwrap().title, "Kept");
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
