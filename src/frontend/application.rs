use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

use async_channel::Receiver;

use iced::event;
use iced::keyboard;
use iced::keyboard::key::Named;
use iced::keyboard::Key;
use iced::keyboard::Modifiers;
use iced::widget::Space;
use iced::window;
use iced::Color;
use iced::Element;
use iced::Event;
use iced::Length;
use iced::Subscription;
use iced::Task;

use crate::backend::coordinator::Coordinator;
use crate::backend::events::LyricsEvent;
use crate::backend::filemanager::DataDir;
use crate::backend::lyrics::FetchEvent;
use crate::backend::settings::Preferences;
use crate::backend::util::AM;
use crate::backend::util::Relay;
use crate::backend::util::desync;

use crate::frontend::menubar::ApproximateMeasure;
use crate::frontend::menubar::DisplayState;
use crate::frontend::menubar::MenuBarPresenter;
use crate::frontend::message::Message;
use crate::frontend::overlay::OverlayPresenter;
use crate::frontend::tray::SimpleTray;
use crate::frontend::tray::TrayMessage;
use crate::frontend::tray::TrayStatusSurface;
use crate::frontend::widgets::overlay_opacity;
use crate::frontend::widgets::parse_colour;
use crate::frontend::widgets::LyricbarWidget;
use crate::frontend::widgets::OverlayStyle;

const TICK: Duration = Duration::from_millis(100);
const OFFSET_STEP: i64 = 100;
const SEEK_STEP: f64 = 5.0;

pub struct Application {
    coordinator: Coordinator,
    preferences: AM<Preferences>,
    directories: DataDir,

    overlay: OverlayPresenter,
    hovered: bool,
    menu_bar: Option<MenuBarPresenter<TrayStatusSurface, ApproximateMeasure>>,
    _tray: Option<SimpleTray>
}

impl Application {
    pub fn new(
        mut coordinator: Coordinator,
        preferences: AM<Preferences>,
        directories: DataDir,
        events: Receiver<LyricsEvent>,
        fetches: Receiver<FetchEvent>
    ) -> (Self, Task<Message>) {
        coordinator.current_player_changed();
        let application = Self {
            coordinator,
            overlay: OverlayPresenter::new(preferences.clone()),
            hovered: false,
            preferences,
            directories,
            menu_bar: None,
            _tray: None
        };

        (application, Task::batch(vec![
            Message::StartTray.task(),
            Task::stream(Relay::consume_receiver(events, Message::Lyrics)),
            Task::stream(Relay::consume_receiver(fetches, Message::Fetch))
        ]))
    }

    pub fn view(&self) -> Element<'_, Message> {
        if self.overlay.state() == DisplayState::Hidden {
            return Space::new(Length::Fixed(0.0), Length::Fixed(0.0)).into();
        }

        let style = {
            let preferences = desync(&self.preferences);
            OverlayStyle {
                font_size: preferences.overlay_font_size,
                colour: parse_colour(&preferences.overlay_colour).unwrap_or(Color::WHITE),
                shadow: parse_colour(&preferences.overlay_shadow_colour).unwrap_or(Color::TRANSPARENT),
                opacity: overlay_opacity(self.hovered, preferences.overlay_hide_with_mouse)
            }
        };
        LyricbarWidget::overlay(self.overlay.labels(), style)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch(vec![
            iced::time::every(TICK).map(|_| Message::Tick),
            keyboard::on_key_press(Self::key_pressed),
            event::listen_with(Self::file_dropped)
        ])
    }

    fn key_pressed(key: Key, _modifiers: Modifiers) -> Option<Message> {
        match key {
            Key::Named(Named::ArrowUp) => Some(Message::AdjustOffset(OFFSET_STEP)),
            Key::Named(Named::ArrowDown) => Some(Message::AdjustOffset(-OFFSET_STEP)),
            Key::Named(Named::ArrowRight) => Some(Message::Seek(SEEK_STEP)),
            Key::Named(Named::ArrowLeft) => Some(Message::Seek(-SEEK_STEP)),
            Key::Named(Named::Space) => Some(Message::TogglePlayback),
            _ => None
        }
    }

    fn file_dropped(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
        match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None
        }
    }

    fn save_preferences(&self) {
        if let Err(e) = desync(&self.preferences).save(self.directories.get_root_ref()) {
            log::warn!("Could not save preferences: {e}");
        }
    }

    fn import_file(&mut self, path: &Path) {
        let is_lrc = path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("lrc"));
        if !is_lrc {
            log::debug!("Ignoring dropped file {path:?}");
            return;
        }

        match read_to_string(path) {
            Ok(contents) => {
                if !self.coordinator.import_lyrics(&contents) {
                    log::warn!("{path:?} could not be imported");
                }
            }
            Err(e) => log::warn!("Could not read {path:?}: {e}")
        }
    }

    fn tray_message(&mut self, message: TrayMessage) -> Task<Message> {
        {
            let mut preferences = desync(&self.preferences);
            match message {
                TrayMessage::ToggleMenuBarLyrics => preferences.menu_bar_lyrics_enabled = !preferences.menu_bar_lyrics_enabled,
                TrayMessage::ToggleCombined => preferences.combined_menu_bar_lyrics = !preferences.combined_menu_bar_lyrics,
                TrayMessage::ToggleOverlay => preferences.overlay_enabled = !preferences.overlay_enabled,
                TrayMessage::OffsetUp => return Message::AdjustOffset(OFFSET_STEP).task(),
                TrayMessage::OffsetDown => return Message::AdjustOffset(-OFFSET_STEP).task(),
                TrayMessage::Quit => return Message::Quit.task()
            }
        }

        self.save_preferences();
        if let Some(menu_bar) = self.menu_bar.as_mut() {
            menu_bar.update();
        }
        Task::none()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                if self.coordinator.poll() {
                    return Message::Quit.task();
                }
                Task::none()
            }

            Message::Lyrics(LyricsEvent::LyricsChanged(summary)) => {
                match summary {
                    Some(summary) => log::debug!(
                        "Now showing {} lines for \"{}\" by {} ({}, offset {} ms)",
                        summary.lines, summary.title, summary.artist, summary.source.name(), summary.offset
                    ),
                    None => log::debug!("Lyrics cleared")
                }
                Task::none()
            }

            Message::Lyrics(LyricsEvent::PositionChanged(position)) => {
                if let Some(transition) = self.overlay.handle_position(&position) {
                    log::debug!("Overlay: {} labels out, {} in", transition.removed.len(), transition.added.len());
                    // A hidden overlay never sees the pointer leave
                    if transition.hidden {
                        self.hovered = false;
                    }
                }
                if let Some(menu_bar) = self.menu_bar.as_mut() {
                    menu_bar.handle_position(&position);
                }
                Task::none()
            }

            Message::Fetch(FetchEvent::Candidate(document)) => {
                self.coordinator.lyrics_received(document);
                Task::none()
            }

            Message::Fetch(FetchEvent::Completed(request)) => {
                self.coordinator.fetch_completed(&request);
                Task::none()
            }

            Message::StartTray => {
                let created = SimpleTray::new(&desync(&self.preferences));
                match created {
                    Ok((mut tray, surface)) => {
                        let receiver = tray.take_receiver();
                        self.menu_bar = Some(MenuBarPresenter::new(surface, ApproximateMeasure::default(), self.preferences.clone()));
                        self._tray = Some(tray);
                        match receiver {
                            Some(receiver) => Task::stream(Relay::consume_receiver(receiver, Message::Tray)),
                            None => Task::none()
                        }
                    }
                    Err(e) => {
                        log::warn!("Running without a tray: {e}");
                        Task::none()
                    }
                }
            }

            Message::Tray(message) => self.tray_message(message),

            Message::AdjustOffset(delta) => {
                self.coordinator.adjust_offset(delta);
                Task::none()
            }

            Message::Seek(delta) => {
                self.coordinator.seek_by(delta);
                Task::none()
            }

            Message::TogglePlayback => {
                self.coordinator.toggle_playback();
                Task::none()
            }

            Message::OverlayHovered(hovered) => {
                self.hovered = hovered;
                Task::none()
            }

            Message::FileDropped(path) => {
                self.import_file(&path);
                Task::none()
            }

            Message::Quit => {
                log::info!("Quitting");
                iced::exit()
            }
        }
    }
}
