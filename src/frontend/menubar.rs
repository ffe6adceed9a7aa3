use crate::backend::events::PositionEvent;
use crate::backend::settings::Preferences;
use crate::backend::util::AM;
use crate::backend::util::desync;

const ELLIPSIS: &str = "...";

/// How a display surface is currently presenting itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Hidden,
    ShowingImage,
    ShowingText
}

pub trait TextMeasure {
    fn width(&self, text: &str) -> f32;
}

/// Fixed advance per character, double for wide glyphs.
#[derive(Debug, Clone, Copy)]
pub struct ApproximateMeasure {
    pub advance: f32
}

impl Default for ApproximateMeasure {
    fn default() -> Self { Self { advance: 7.5 } }
}

impl TextMeasure for ApproximateMeasure {
    fn width(&self, text: &str) -> f32 {
        text.chars().map(|c| if is_wide(c) { 2.0 } else { 1.0 }).sum::<f32>() * self.advance
    }
}

pub fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1F64F
        | 0x20000..=0x3FFFD
    )
}

/// The menu bar as the presenter sees it: one status item that shows either the
/// app image or text, plus an optional second item holding only lyrics.
pub trait StatusSurface {
    fn show_image(&mut self);
    fn show_text(&mut self, text: &str);

    /// `None` removes the lyrics item.
    fn set_lyrics_item(&mut self, text: Option<&str>);
}

/// Split into droppable pieces. Whitespace stays attached to the word before it,
/// wide characters are words of their own.
fn words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut in_space = false;
    let mut after_wide = false;

    for (index, c) in text.char_indices() {
        if c.is_whitespace() {
            in_space = true;
            continue;
        }
        if index > start && (in_space || after_wide || is_wide(c)) {
            words.push(&text[start..index]);
            start = index;
        }
        in_space = false;
        after_wide = is_wide(c);
    }

    if start < text.len() {
        words.push(&text[start..]);
    }
    words
}

/// Longest prefix of whole words that fits in `available` once an ellipsis is added.
/// `None` when not even one word fits.
pub fn truncate(text: &str, available: f32, measure: &dyn TextMeasure) -> Option<String> {
    if measure.width(text) <= available {
        return Some(text.to_string());
    }

    let mut words = words(text);
    while words.pop().is_some() && !words.is_empty() {
        let proposed = format!("{}{ELLIPSIS}", words.concat().trim_end());
        if measure.width(&proposed) <= available {
            return Some(proposed);
        }
    }
    None
}

pub struct MenuBarPresenter<S: StatusSurface, M: TextMeasure> {
    surface: S,
    measure: M,
    preferences: AM<Preferences>,
    lyrics: String,
    state: DisplayState
}

impl<S: StatusSurface, M: TextMeasure> MenuBarPresenter<S, M> {
    pub fn new(surface: S, measure: M, preferences: AM<Preferences>) -> Self {
        let mut presenter = Self {
            surface,
            measure,
            preferences,
            lyrics: String::new(),
            state: DisplayState::Hidden
        };
        presenter.update();
        presenter
    }

    #[cfg(test)]
    pub fn state(&self) -> DisplayState { self.state }

    #[cfg(test)]
    pub fn surface(&self) -> &S { &self.surface }

    pub fn handle_position(&mut self, event: &PositionEvent) {
        let paused_hides = desync(&self.preferences).disable_lyrics_when_paused;
        if paused_hides && !event.playing {
            if self.lyrics.is_empty() && self.state == DisplayState::ShowingImage {
                return;
            }
            self.lyrics.clear();
            self.update();
            return;
        }

        if event.current_text() == self.lyrics {
            return;
        }
        self.lyrics = event.current_text().to_string();
        self.update();
    }

    /// Re-render with the current preferences.
    pub fn update(&mut self) {
        let (enabled, combined, available) = {
            let preferences = desync(&self.preferences);
            (preferences.menu_bar_lyrics_enabled, preferences.combined_menu_bar_lyrics, preferences.menu_bar_width)
        };

        if !enabled || self.lyrics.is_empty() {
            self.surface.set_lyrics_item(None);
            self.show_image();
            return;
        }

        if combined {
            self.surface.set_lyrics_item(None);
            match truncate(&self.lyrics, available, &self.measure) {
                Some(text) => {
                    self.surface.show_text(&text);
                    self.state = DisplayState::ShowingText;
                }
                None => {
                    log::debug!("\"{}\" does not fit in the menu bar", self.lyrics);
                    self.show_image();
                }
            }
        } else {
            self.show_image();
            self.surface.set_lyrics_item(Some(&self.lyrics));
            self.state = DisplayState::ShowingText;
        }
    }

    fn show_image(&mut self) {
        self.surface.show_image();
        self.state = DisplayState::ShowingImage;
    }
}
