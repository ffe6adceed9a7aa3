use std::fmt::Formatter;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

/// A track as reported by the player. Everything except the id is optional, players often leave metadata out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<f64>,
    pub path: Option<PathBuf>
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            artist: Some(artist.into()),
            ..Self::default()
        }
    }

    /// Build a track from a local file named `Artist - Title.ext`. Without a separator the whole stem is the title.
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        let (artist, title) = match stem.split_once(" - ") {
            Some((artist, title)) => (Some(artist.trim().to_string()), Some(title.trim().to_string())),
            None => (None, Some(stem.trim().to_string()))
        };

        Self {
            id: path.to_string_lossy().to_string(),
            title,
            artist,
            album: None,
            duration: None,
            path: Some(path.to_path_buf())
        }
    }

    pub fn title(&self) -> &str { self.title.as_deref().unwrap_or("") }
    pub fn artist(&self) -> &str { self.artist.as_deref().unwrap_or("") }
    pub fn duration(&self) -> f64 { self.duration.unwrap_or(0.0) }

    /// Sibling `.lrc` file next to the audio file, if the track is a local file.
    pub fn lyrics_path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|path| path.with_extension("lrc"))
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{} by {}", self.title(), self.artist())?;
        if let Some(album) = self.album.as_ref() {
            write!(f, " on {album}")?;
        }
        write!(f, " ({})", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool { *self == PlaybackState::Playing }
}

/// The external player. The coordinator only ever polls it.
pub trait MusicPlayer {
    fn current_track(&self) -> Option<Track>;
    fn playback_state(&self) -> PlaybackState;

    /// Playback position in seconds, `None` when nothing is loaded.
    fn position(&self) -> Option<f64>;

    fn is_running(&self) -> bool { true }

    /// Play when paused, pause when playing. Players that cannot be controlled ignore this.
    fn toggle_playback(&mut self) {}

    /// Jump to `position` seconds. Players that cannot be controlled ignore this.
    fn seek(&mut self, _position: f64) {}

    /// Lyrics text stored inside the player for the current track.
    fn embedded_lyrics(&self) -> Option<String> { None }

    /// Store lyrics text inside the player. Returns whether the player accepted it.
    fn set_embedded_lyrics(&mut self, _lyrics: String) -> bool { false }
}

/// Stand-in player that advances a wall clock while "playing".
pub struct ClockPlayer {
    track: Option<Track>,
    state: PlaybackState,
    anchor: f64,
    started: Option<Instant>,
    embedded: Option<String>
}

impl ClockPlayer {
    pub fn new() -> Self {
        Self {
            track: None,
            state: PlaybackState::Stopped,
            anchor: 0.0,
            started: None,
            embedded: None
        }
    }

    /// Load a track and start it from the beginning.
    pub fn load(&mut self, track: Track) {
        self.track = Some(track);
        self.embedded = None;
        self.anchor = 0.0;
        self.started = None;
        self.play();
    }

    pub fn play(&mut self) {
        if self.track.is_none() || self.state == PlaybackState::Playing { return; }
        self.started = Some(Instant::now());
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing { return; }
        self.anchor = self.elapsed();
        self.started = None;
        self.state = PlaybackState::Paused;
    }

    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            _ => self.play()
        }
    }

    fn elapsed(&self) -> f64 {
        let running = match self.started {
            Some(started) => started.elapsed().as_secs_f64(),
            None => 0.0
        };
        let position = self.anchor + running;
        match self.track.as_ref().and_then(|track| track.duration) {
            Some(duration) if duration > 0.0 => position.min(duration),
            _ => position
        }
    }
}

impl Default for ClockPlayer {
    fn default() -> Self { Self::new() }
}

impl MusicPlayer for ClockPlayer {
    fn current_track(&self) -> Option<Track> { self.track.clone() }

    fn playback_state(&self) -> PlaybackState { self.state }

    fn position(&self) -> Option<f64> {
        self.track.as_ref().map(|_| self.elapsed())
    }

    fn toggle_playback(&mut self) { self.toggle() }

    fn seek(&mut self, position: f64) {
        self.anchor = position.max(0.0);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn embedded_lyrics(&self) -> Option<String> { self.embedded.clone() }

    fn set_embedded_lyrics(&mut self, lyrics: String) -> bool {
        if self.track.is_none() { return false; }
        self.embedded = Some(lyrics);
        true
    }
}
