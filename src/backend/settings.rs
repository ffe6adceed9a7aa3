use std::default::Default;
use std::path::Path;
use std::fs::read_to_string;
use std::fs::write;

use crate::backend::document::LyricsSource;
use crate::backend::error::LyricbarError;

const CONFIG_FILE: &str = ".conf";

/// User preferences, stored as `key = value` lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub menu_bar_lyrics_enabled: bool,
    pub combined_menu_bar_lyrics: bool,
    pub menu_bar_width: f32,
    pub overlay_enabled: bool,
    pub overlay_one_line: bool,
    pub overlay_prefer_translation: bool,
    pub overlay_font_size: u16,
    pub overlay_colour: String,
    pub overlay_shadow_colour: String,
    pub overlay_hide_with_mouse: bool,
    pub disable_lyrics_when_paused: bool,
    pub load_lyrics_beside_track: bool,
    pub preferred_source: Option<LyricsSource>,
    pub write_to_player_automatically: bool,
    pub write_with_translation: bool,
    pub launch_and_quit_with_player: bool,
    pub no_searching_track_ids: Vec<String>,
    pub filter_keys: Vec<String>
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Setting {
    MenuBarLyricsEnabled,
    CombinedMenuBarLyrics,
    MenuBarWidth,
    OverlayEnabled,
    OverlayOneLine,
    OverlayPreferTranslation,
    OverlayFontSize,
    OverlayColour,
    OverlayShadowColour,
    OverlayHideWithMouse,
    DisableLyricsWhenPaused,
    LoadLyricsBesideTrack,
    PreferredSource,
    WriteToPlayerAutomatically,
    WriteWithTranslation,
    LaunchAndQuitWithPlayer,
    NoSearchingTrackIds,
    FilterKeys
}

impl Setting {
    const ALL: [Setting; 18] = [
        Setting::MenuBarLyricsEnabled,
        Setting::CombinedMenuBarLyrics,
        Setting::MenuBarWidth,
        Setting::OverlayEnabled,
        Setting::OverlayOneLine,
        Setting::OverlayPreferTranslation,
        Setting::OverlayFontSize,
        Setting::OverlayColour,
        Setting::OverlayShadowColour,
        Setting::OverlayHideWithMouse,
        Setting::DisableLyricsWhenPaused,
        Setting::LoadLyricsBesideTrack,
        Setting::PreferredSource,
        Setting::WriteToPlayerAutomatically,
        Setting::WriteWithTranslation,
        Setting::LaunchAndQuitWithPlayer,
        Setting::NoSearchingTrackIds,
        Setting::FilterKeys
    ];

    fn key(&self) -> &'static str {
        match self {
            Setting::MenuBarLyricsEnabled => "menu_bar_lyrics_enabled",
            Setting::CombinedMenuBarLyrics => "combined_menu_bar_lyrics",
            Setting::MenuBarWidth => "menu_bar_width",
            Setting::OverlayEnabled => "overlay_enabled",
            Setting::OverlayOneLine => "overlay_one_line",
            Setting::OverlayPreferTranslation => "overlay_prefer_translation",
            Setting::OverlayFontSize => "overlay_font_size",
            Setting::OverlayColour => "overlay_colour",
            Setting::OverlayShadowColour => "overlay_shadow_colour",
            Setting::OverlayHideWithMouse => "overlay_hide_with_mouse",
            Setting::DisableLyricsWhenPaused => "disable_lyrics_when_paused",
            Setting::LoadLyricsBesideTrack => "load_lyrics_beside_track",
            Setting::PreferredSource => "preferred_source",
            Setting::WriteToPlayerAutomatically => "write_to_player_automatically",
            Setting::WriteWithTranslation => "write_with_translation",
            Setting::LaunchAndQuitWithPlayer => "launch_and_quit_with_player",
            Setting::NoSearchingTrackIds => "no_searching_track_ids",
            Setting::FilterKeys => "filter_keys"
        }
    }

    fn from_string(string: &str) -> Option<Setting> {
        let string = string.to_lowercase();
        Setting::ALL.into_iter().find(|setting| setting.key() == string)
    }
}

struct ConfigLine {
    target_setting: Setting,
    value: String
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

impl Preferences {
    pub fn load(directory: &Path) -> Preferences {
        let config_path = directory.join(CONFIG_FILE);
        if !config_path.exists() { return Preferences::default(); }

        let lines: Vec<ConfigLine> = match read_to_string(&config_path) {
            Ok(lines) => lines
                .lines()
                .filter_map(|line| {
                    let (key, value) = line.split_once('=')?;
                    Setting::from_string(key.trim()).map(
                        |setting| ConfigLine { target_setting: setting, value: value.trim().to_string() }
                    )
                })
                .collect(),
            Err(e) => {
                log::warn!("Could not read {config_path:?}: {e}");
                return Preferences::default();
            }
        };

        let mut preferences = Preferences::default();
        lines.into_iter().for_each(|line| preferences.apply(line));
        preferences
    }

    fn apply(&mut self, line: ConfigLine) {
        let value = line.value.as_str();
        match line.target_setting {
            Setting::MenuBarLyricsEnabled => if let Some(v) = parse_bool(value) { self.menu_bar_lyrics_enabled = v },
            Setting::CombinedMenuBarLyrics => if let Some(v) = parse_bool(value) { self.combined_menu_bar_lyrics = v },
            Setting::MenuBarWidth => if let Ok(v) = value.parse::<f32>() {
                if v > 0.0 { self.menu_bar_width = v }
            },
            Setting::OverlayEnabled => if let Some(v) = parse_bool(value) { self.overlay_enabled = v },
            Setting::OverlayOneLine => if let Some(v) = parse_bool(value) { self.overlay_one_line = v },
            Setting::OverlayPreferTranslation => if let Some(v) = parse_bool(value) { self.overlay_prefer_translation = v },
            Setting::OverlayFontSize => if let Ok(v) = value.parse::<u16>() {
                if v > 0 { self.overlay_font_size = v }
            },
            Setting::OverlayColour => self.overlay_colour = value.trim_start_matches('#').to_string(),
            Setting::OverlayShadowColour => self.overlay_shadow_colour = value.trim_start_matches('#').to_string(),
            Setting::OverlayHideWithMouse => if let Some(v) = parse_bool(value) { self.overlay_hide_with_mouse = v },
            Setting::DisableLyricsWhenPaused => if let Some(v) = parse_bool(value) { self.disable_lyrics_when_paused = v },
            Setting::LoadLyricsBesideTrack => if let Some(v) = parse_bool(value) { self.load_lyrics_beside_track = v },
            Setting::PreferredSource => self.preferred_source = LyricsSource::from_name(value),
            Setting::WriteToPlayerAutomatically => if let Some(v) = parse_bool(value) { self.write_to_player_automatically = v },
            Setting::WriteWithTranslation => if let Some(v) = parse_bool(value) { self.write_with_translation = v },
            Setting::LaunchAndQuitWithPlayer => if let Some(v) = parse_bool(value) { self.launch_and_quit_with_player = v },
            Setting::NoSearchingTrackIds => self.no_searching_track_ids = parse_list(value),
            Setting::FilterKeys => self.filter_keys = parse_list(value)
        }
    }

    fn value_of(&self, setting: Setting) -> String {
        match setting {
            Setting::MenuBarLyricsEnabled => self.menu_bar_lyrics_enabled.to_string(),
            Setting::CombinedMenuBarLyrics => self.combined_menu_bar_lyrics.to_string(),
            Setting::MenuBarWidth => self.menu_bar_width.to_string(),
            Setting::OverlayEnabled => self.overlay_enabled.to_string(),
            Setting::OverlayOneLine => self.overlay_one_line.to_string(),
            Setting::OverlayPreferTranslation => self.overlay_prefer_translation.to_string(),
            Setting::OverlayFontSize => self.overlay_font_size.to_string(),
            Setting::OverlayColour => self.overlay_colour.clone(),
            Setting::OverlayShadowColour => self.overlay_shadow_colour.clone(),
            Setting::OverlayHideWithMouse => self.overlay_hide_with_mouse.to_string(),
            Setting::DisableLyricsWhenPaused => self.disable_lyrics_when_paused.to_string(),
            Setting::LoadLyricsBesideTrack => self.load_lyrics_beside_track.to_string(),
            Setting::PreferredSource => self.preferred_source.map(|source| source.name()).unwrap_or("").to_string(),
            Setting::WriteToPlayerAutomatically => self.write_to_player_automatically.to_string(),
            Setting::WriteWithTranslation => self.write_with_translation.to_string(),
            Setting::LaunchAndQuitWithPlayer => self.launch_and_quit_with_player.to_string(),
            Setting::NoSearchingTrackIds => self.no_searching_track_ids.join(","),
            Setting::FilterKeys => self.filter_keys.join(",")
        }
    }

    pub fn save(&self, directory: &Path) -> Result<(), LyricbarError> {
        let contents = Setting::ALL
            .iter()
            .map(|setting| format!("{} = {}", setting.key(), self.value_of(*setting)))
            .collect::<Vec<String>>()
            .join("\n");
        write(directory.join(CONFIG_FILE), contents + "\n")?;
        Ok(())
    }

    pub fn is_preferred(&self, source: LyricsSource) -> bool {
        self.preferred_source == Some(source)
    }

    pub fn skips_search(&self, track_id: &str) -> bool {
        self.no_searching_track_ids.iter().any(|id| id == track_id)
    }
}

impl Default for Preferences {
    fn default() -> Preferences {
        Preferences {
            menu_bar_lyrics_enabled: true,
            combined_menu_bar_lyrics: false,
            menu_bar_width: 320.0,
            overlay_enabled: true,
            overlay_one_line: false,
            overlay_prefer_translation: true,
            overlay_font_size: 24,
            overlay_colour: String::from("ffffff"),
            overlay_shadow_colour: String::from("00fdff"),
            overlay_hide_with_mouse: true,
            disable_lyrics_when_paused: true,
            load_lyrics_beside_track: true,
            preferred_source: None,
            write_to_player_automatically: false,
            write_with_translation: false,
            launch_and_quit_with_player: false,
            no_searching_track_ids: Vec::new(),
            filter_keys: ["作词", "作曲", "编曲", "Lyrics by", "Composed by"]
                .into_iter()
                .map(String::from)
                .collect()
        }
    }
}
