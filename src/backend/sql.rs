pub const CREATE_LYRICS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS Lyrics (
        title TEXT NOT NULL,
        artist TEXT NOT NULL,
        source TEXT NOT NULL,
        content TEXT NOT NULL,
        PRIMARY KEY (title, artist)
    );
";

pub const UPSERT_LYRICS: &str = "
    INSERT OR REPLACE INTO Lyrics
    VALUES(?, ?, ?, ?)
";

pub const SELECT_LYRICS: &str = "SELECT content FROM Lyrics WHERE title = ? AND artist = ?";
pub const COUNT_LYRICS: &str = "SELECT COUNT(*) FROM Lyrics";
