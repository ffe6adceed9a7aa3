use std::path::PathBuf;

use crate::backend::events::LyricsEvent;
use crate::backend::lyrics::FetchEvent;
use crate::frontend::tray::TrayMessage;

#[derive(Clone, Debug)]
pub enum Message {
    Tick,                      // Poll the player and publish the position
    Lyrics(LyricsEvent),       // Coordinator event bus
    Fetch(FetchEvent),         // Lyrics fetcher thread
    Tray(TrayMessage),         // Tray menu clicks
    StartTray,                 // The tray has to be built once the event loop is running
    AdjustOffset(i64),         // Milliseconds
    Seek(f64),                 // Seconds, relative to the current position
    TogglePlayback,
    OverlayHovered(bool),
    FileDropped(PathBuf),
    Quit
}

impl Message {
    pub fn task(self) -> iced::Task<Message> {
        iced::Task::done(self)
    }
}
