use crate::backend::events::PositionEvent;
use crate::backend::settings::Preferences;
use crate::backend::util::AM;
use crate::backend::util::desync;
use crate::frontend::menubar::DisplayState;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLabel {
    pub id: u64,
    pub text: String
}

/// What changed between two renders of the overlay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayTransition {
    pub removed: Vec<u64>,
    pub added: Vec<OverlayLabel>,
    pub hidden: bool
}

/// Floating window with up to two rows: the current line and either its translation or the next line.
pub struct OverlayPresenter {
    preferences: AM<Preferences>,
    labels: Vec<OverlayLabel>,
    next_id: u64,
    state: DisplayState
}

impl OverlayPresenter {
    pub fn new(preferences: AM<Preferences>) -> Self {
        Self { preferences, labels: Vec::new(), next_id: 0, state: DisplayState::Hidden }
    }

    pub fn state(&self) -> DisplayState { self.state }

    pub fn labels(&self) -> &[OverlayLabel] { &self.labels }

    /// Work out both rows for `event` and display them. `None` when nothing changed.
    pub fn handle_position(&mut self, event: &PositionEvent) -> Option<OverlayTransition> {
        let (first, second) = self.rows(event);
        let unchanged = match self.labels.as_slice() {
            [] => first.is_empty() && second.is_empty(),
            [only] => only.text == first && second.is_empty(),
            [top, bottom] => top.text == first && bottom.text == second,
            _ => false
        };
        if unchanged && (self.state == DisplayState::Hidden) == first.is_empty() {
            return None;
        }
        Some(self.display(&first, &second))
    }

    fn rows(&self, event: &PositionEvent) -> (String, String) {
        let preferences = desync(&self.preferences);
        if !preferences.overlay_enabled || (preferences.disable_lyrics_when_paused && !event.playing) {
            return (String::new(), String::new());
        }

        let first = event.current_text().to_string();
        if first.is_empty() || preferences.overlay_one_line {
            return (first, String::new());
        }

        let translation = event.current
            .as_ref()
            .and_then(|line| line.translation.clone())
            .filter(|_| preferences.overlay_prefer_translation);
        let second = match translation {
            Some(translation) => translation,
            None => event.next.as_ref().map(|line| line.content.clone()).unwrap_or_default()
        };
        (first, second)
    }

    fn label(&mut self, text: &str) -> OverlayLabel {
        self.next_id += 1;
        OverlayLabel { id: self.next_id, text: text.to_string() }
    }

    /// Swap the visible labels. A second row that becomes the first row keeps its label.
    pub fn display(&mut self, first: &str, second: &str) -> OverlayTransition {
        let mut outgoing = std::mem::take(&mut self.labels);
        let mut added = Vec::new();
        let hidden = first.is_empty();

        if !hidden {
            if outgoing.len() == 2 && outgoing[1].text == first {
                self.labels.push(outgoing.remove(1));
            } else {
                let label = self.label(first);
                added.push(label.clone());
                self.labels.push(label);
            }
        }

        if !second.is_empty() {
            let label = self.label(second);
            added.push(label.clone());
            self.labels.push(label);
        }

        self.state = if hidden { DisplayState::Hidden } else { DisplayState::ShowingText };
        OverlayTransition {
            removed: outgoing.into_iter().map(|label| label.id).collect(),
            added,
            hidden
        }
    }
}
