use tray_icon::{
    menu::{CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem}, Icon, TrayIcon, TrayIconBuilder
};

use async_channel::unbounded;
use async_channel::Receiver;

use std::thread;
use image::GenericImageView;

use crate::backend::error::LyricbarError;
use crate::backend::settings::Preferences;
use crate::frontend::menubar::StatusSurface;

const ICON_BYTES: &[u8] = include_bytes!("assets/icons/icon.png");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayMessage {
    ToggleMenuBarLyrics,
    ToggleCombined,
    ToggleOverlay,
    OffsetUp,
    OffsetDown,
    Quit
}

fn tray_error(e: impl std::fmt::Display) -> LyricbarError {
    LyricbarError::Tray(e.to_string())
}

fn load_icon() -> Result<Icon, LyricbarError> {
    let img = image::load_from_memory(ICON_BYTES).map_err(tray_error)?;
    let (width, height) = img.dimensions();
    Icon::from_rgba(img.to_rgba8().into_vec(), width, height).map_err(tray_error)
}

/// The tray icon doubles as the menu bar status item. Lyrics go into its title.
pub struct TrayStatusSurface {
    status_item: TrayIcon,
    lyrics_item: Option<TrayIcon>,
    icon: Icon
}

impl StatusSurface for TrayStatusSurface {
    fn show_image(&mut self) {
        self.status_item.set_title(None::<&str>);
        if let Err(e) = self.status_item.set_icon(Some(self.icon.clone())) {
            log::warn!("Could not restore tray icon: {e}");
        }
    }

    fn show_text(&mut self, text: &str) {
        if let Err(e) = self.status_item.set_icon(None) {
            log::warn!("Could not clear tray icon: {e}");
        }
        self.status_item.set_title(Some(text));
    }

    fn set_lyrics_item(&mut self, text: Option<&str>) {
        let text = match text {
            Some(text) => text,
            None => {
                self.lyrics_item = None;
                return;
            }
        };

        match self.lyrics_item.as_ref() {
            Some(item) => item.set_title(Some(text)),
            None => match TrayIconBuilder::new().with_title(text).build() {
                Ok(item) => self.lyrics_item = Some(item),
                Err(e) => log::warn!("Could not create lyrics item: {e}")
            }
        }
    }
}

pub struct SimpleTray {
    _event_thread: thread::JoinHandle<()>,
    out: Option<Receiver<TrayMessage>>
}

impl SimpleTray {
    pub fn take_receiver(&mut self) -> Option<Receiver<TrayMessage>> {
        self.out.take()
    }

    /// Build the tray menu and icon. Must run on the thread that owns the event loop.
    pub fn new(preferences: &Preferences) -> Result<(Self, TrayStatusSurface), LyricbarError> {
        let icon = load_icon()?;
        let menu = Menu::new();

        let menu_bar_item = CheckMenuItem::new("Menu Bar Lyrics", true, preferences.menu_bar_lyrics_enabled, None);
        let combined_item = CheckMenuItem::new("Combine With Icon", true, preferences.combined_menu_bar_lyrics, None);
        let overlay_item = CheckMenuItem::new("Floating Lyrics", true, preferences.overlay_enabled, None);
        let offset_up_item = MenuItem::new("Offset +100 ms", true, None);
        let offset_down_item = MenuItem::new("Offset -100 ms", true, None);
        let quit_item = MenuItem::new("Quit", true, None);

        menu.append(&menu_bar_item).map_err(tray_error)?;
        menu.append(&combined_item).map_err(tray_error)?;
        menu.append(&overlay_item).map_err(tray_error)?;
        menu.append(&PredefinedMenuItem::separator()).map_err(tray_error)?;
        menu.append(&offset_up_item).map_err(tray_error)?;
        menu.append(&offset_down_item).map_err(tray_error)?;
        menu.append(&PredefinedMenuItem::separator()).map_err(tray_error)?;
        menu.append(&quit_item).map_err(tray_error)?;

        let status_item = TrayIconBuilder::new()
            .with_icon(icon.clone())
            .with_tooltip("Lyricbar")
            .with_menu(Box::new(menu))
            .build()
            .map_err(tray_error)?;

        let routes: Vec<(MenuId, TrayMessage)> = vec![
            (menu_bar_item.id().clone(), TrayMessage::ToggleMenuBarLyrics),
            (combined_item.id().clone(), TrayMessage::ToggleCombined),
            (overlay_item.id().clone(), TrayMessage::ToggleOverlay),
            (offset_up_item.id().clone(), TrayMessage::OffsetUp),
            (offset_down_item.id().clone(), TrayMessage::OffsetDown),
            (quit_item.id().clone(), TrayMessage::Quit)
        ];

        let (sender, receiver) = unbounded();

        let event_thread = thread::spawn(move || {
            let menu_events = MenuEvent::receiver();
            while let Ok(event) = menu_events.recv() {
                let message = routes.iter().find(|(id, _)| *id == event.id).map(|(_, message)| *message);
                if let Some(message) = message {
                    log::debug!("Tray menu: {message:?}");
                    if sender.send_blocking(message).is_err() {
                        break;
                    }
                }
            }
        });

        Ok((
            Self { _event_thread: event_thread, out: Some(receiver) },
            TrayStatusSurface { status_item, lyrics_item: None, icon }
        ))
    }
}
