use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::backend::lrc;
use crate::backend::util::normalise;

/// Durations further apart than this score nothing.
const DURATION_TOLERANCE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LyricsLine {
    pub position: f64,
    pub content: String,
    pub translation: Option<String>
}

impl LyricsLine {
    pub fn new(position: f64, content: impl Into<String>) -> Self {
        Self { position, content: content.into(), translation: None }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LyricsSource {
    Local,
    Import,
    Lrclib,
    NetEase
}

impl LyricsSource {
    pub fn name(&self) -> &'static str {
        match self {
            LyricsSource::Local => "local",
            LyricsSource::Import => "import",
            LyricsSource::Lrclib => "lrclib",
            LyricsSource::NetEase => "netease"
        }
    }

    pub fn from_name(name: &str) -> Option<LyricsSource> {
        match name.trim().to_lowercase().as_str() {
            "local" => Some(LyricsSource::Local),
            "import" => Some(LyricsSource::Import),
            "lrclib" => Some(LyricsSource::Lrclib),
            "netease" => Some(LyricsSource::NetEase),
            _ => None
        }
    }
}

/// What the lyrics file itself claims about the song.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub author: Option<String>,
    pub length: Option<f64>
}

/// Where the document came from and which track it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsMetadata {
    pub source: LyricsSource,
    pub title: String,
    pub artist: String,
    pub search_duration: Option<f64>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineIndices {
    pub current: Option<usize>,
    pub next: Option<usize>
}

#[derive(Debug, Clone, PartialEq)]
pub struct LyricsDocument {
    pub lines: Vec<LyricsLine>,
    pub tags: IdTags,
    pub metadata: LyricsMetadata,
    /// Milliseconds added to the player position before lines are looked up.
    pub offset: i64
}

impl LyricsDocument {
    pub fn new(lines: Vec<LyricsLine>, source: LyricsSource) -> Self {
        Self {
            lines,
            tags: IdTags::default(),
            metadata: LyricsMetadata {
                source,
                title: String::new(),
                artist: String::new(),
                search_duration: None
            },
            offset: 0
        }
    }

    pub fn from_lrc(text: &str, source: LyricsSource) -> Option<Self> {
        lrc::parse(text).map(|parsed| {
            let mut document = Self::new(parsed.lines, source);
            document.tags = parsed.tags;
            document.offset = parsed.offset;
            document
        })
    }

    pub fn to_lrc(&self) -> String { lrc::serialise(self) }

    /// Set the title/artist pair this document is for.
    pub fn identify(&mut self, title: &str, artist: &str) {
        self.metadata.title = title.to_string();
        self.metadata.artist = artist.to_string();
    }

    pub fn matches(&self, title: &str, artist: &str) -> bool {
        self.metadata.title == title && self.metadata.artist == artist
    }

    pub fn time_delay(&self) -> f64 { self.offset as f64 / 1000.0 }

    /// Current line is the last one starting at or before `position`, next is the one after it.
    pub fn line_indices(&self, position: f64) -> LineIndices {
        let after = self.lines.partition_point(|line| line.position <= position);
        LineIndices {
            current: if after > 0 { Some(after - 1) } else { None },
            next: if after < self.lines.len() { Some(after) } else { None }
        }
    }

    /// Same as `line_indices` once the user offset is applied to a raw player position.
    pub fn resolve(&self, player_position: f64) -> LineIndices {
        self.line_indices(player_position + self.time_delay())
    }

    pub fn has_translation(&self) -> bool {
        self.lines.iter().any(|line| line.translation.is_some())
    }

    /// Drop credit lines such as `作词：someone`.
    pub fn filtrate(&mut self, keys: &[String]) {
        let before = self.lines.len();
        self.lines.retain(|line| !keys.iter().any(
            |key| !key.is_empty() && (line.content.contains(&format!("{key}:")) || line.content.contains(&format!("{key}：")))
        ));
        if self.lines.len() != before {
            log::debug!("Filtered {} credit lines", before - self.lines.len());
        }
    }

    /// Score in `[0, 1]` used to rank candidates from the same tier.
    pub fn quality(&self) -> f64 {
        let title = similarity(self.tags.title.as_deref(), &self.metadata.title);
        let artist = similarity(self.tags.artist.as_deref(), &self.metadata.artist);
        let duration = match (self.tags.length, self.metadata.search_duration) {
            (Some(length), Some(requested)) if length > 0.0 && requested > 0.0 => {
                1.0 - ((length - requested).abs() / DURATION_TOLERANCE).min(1.0)
            }
            _ => 0.0
        };
        let translation = if self.has_translation() { 1.0 } else { 0.0 };

        0.4 * title + 0.3 * artist + 0.2 * duration + 0.1 * translation
    }

    pub fn is_better_than(&self, other: &LyricsDocument) -> bool {
        self.quality() > other.quality()
    }

    /// Plain text suitable for a player's lyrics field.
    pub fn embedded_text(&self, with_translation: bool) -> String {
        let mut text = self.lines
            .iter()
            .map(|line| match (with_translation, line.translation.as_ref()) {
                (true, Some(translation)) => format!("{}\n{}", line.content, translation),
                _ => line.content.clone()
            })
            .collect::<Vec<String>>()
            .join("\n");

        // One non-overlapping pass: four newlines become three, not two.
        text = text.replace("\n\n\n", "\n\n");

        format!("{}\n", text.trim())
    }
}

fn similarity(claimed: Option<&str>, requested: &str) -> f64 {
    let claimed = match claimed {
        Some(claimed) => normalise(claimed),
        None => return 0.0
    };
    let requested = normalise(requested);

    if claimed.is_empty() || requested.is_empty() { return 0.0; }
    if claimed == requested { return 1.0; }

    let matcher = SkimMatcherV2::default();
    let best = match matcher.fuzzy_match(&requested, &requested) {
        Some(best) if best > 0 => best as f64,
        _ => return 0.0
    };

    match matcher.fuzzy_match(&claimed, &requested) {
        Some(score) => (score as f64 / best).clamp(0.0, 1.0),
        None => 0.0
    }
}
