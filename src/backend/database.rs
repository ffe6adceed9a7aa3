use std::path::Path;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::backend::sql::*;
use crate::backend::error::LyricbarError;
use crate::backend::document::LyricsDocument;
use crate::backend::document::LyricsSource;

/// Lyrics saved on disk, one entry per title/artist pair.
pub struct LyricsCache {
    connection: Connection
}

impl LyricsCache {
    pub fn new(root_dir: &Path) -> Result<Self, LyricbarError> {
        // Creates the database file if it does not exist
        Self::with_connection(Connection::open(root_dir.join("data.db"))?)
    }

    pub fn in_memory() -> Result<Self, LyricbarError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> Result<Self, LyricbarError> {
        connection.execute(CREATE_LYRICS_TABLE, [])?;
        Ok(Self { connection })
    }

    /// Cached lyrics for a track. Entries that no longer parse are treated as missing.
    pub fn load(&self, title: &str, artist: &str) -> Result<Option<LyricsDocument>, LyricbarError> {
        let content: Option<String> = self.connection
            .query_row(SELECT_LYRICS, params![title, artist], |row| row.get::<_, String>(0))
            .optional()?;

        Ok(content.and_then(|content| {
            let mut document = LyricsDocument::from_lrc(&content, LyricsSource::Local)?;
            document.identify(title, artist);
            Some(document)
        }))
    }

    /// Write a document under its title/artist pair, replacing whatever was there.
    pub fn save(&self, document: &LyricsDocument) -> Result<(), LyricbarError> {
        self.connection.execute(UPSERT_LYRICS, params![
            &document.metadata.title,
            &document.metadata.artist,
            document.metadata.source.name(),
            document.to_lrc()
        ])?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize, LyricbarError> {
        let count = self.connection.query_row(COUNT_LYRICS, [], |row| row.get::<_, i64>(0))?;
        Ok(count as usize)
    }
}
