use async_channel::Receiver;
use async_channel::Sender;
use async_channel::unbounded;

use crate::backend::document::LineIndices;
use crate::backend::document::LyricsLine;
use crate::backend::document::LyricsSource;
use crate::backend::util::AM;
use crate::backend::util::desync;
use crate::backend::util::sync;

/// Where playback is and which lines that resolves to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionEvent {
    pub position: f64,
    pub indices: LineIndices,
    pub current: Option<LyricsLine>,
    pub next: Option<LyricsLine>,
    pub playing: bool
}

impl PositionEvent {
    /// No lyrics at all. Every surface clears when it sees this.
    pub fn empty(playing: bool) -> Self {
        Self { playing, ..Self::default() }
    }

    pub fn current_text(&self) -> &str {
        self.current.as_ref().map(|line| line.content.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LyricsSummary {
    pub title: String,
    pub artist: String,
    pub source: LyricsSource,
    pub offset: i64,
    pub lines: usize
}

#[derive(Debug, Clone, PartialEq)]
pub enum LyricsEvent {
    LyricsChanged(Option<LyricsSummary>),
    PositionChanged(PositionEvent)
}

/// Fan-out of coordinator events. Every subscriber gets its own unbounded channel.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: AM<Vec<Sender<LyricsEvent>>>
}

impl EventBus {
    pub fn new() -> Self {
        Self { subscribers: sync(Vec::new()) }
    }

    pub fn subscribe(&self) -> Receiver<LyricsEvent> {
        let (sender, receiver) = unbounded();
        desync(&self.subscribers).push(sender);
        receiver
    }

    /// Deliver to every live subscriber, forgetting the ones whose receiver has gone.
    pub fn publish(&self, event: LyricsEvent) {
        desync(&self.subscribers).retain(|subscriber| subscriber.try_send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        desync(&self.subscribers).len()
    }
}
