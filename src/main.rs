mod frontend;
mod backend;

use std::path::Path;

use anyhow::anyhow;
use iced::window;
use iced::Size;
use iced::Theme;

use backend::coordinator::Coordinator;
use backend::coordinator::Services;
use backend::database::LyricsCache;
use backend::events::EventBus;
use backend::filemanager::DataDir;
use backend::lyrics::LyricsFetcher;
use backend::music::ClockPlayer;
use backend::music::Track;
use backend::providers::Provider;
use backend::settings::Preferences;
use backend::util::sync;
use frontend::application::Application;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let directories = DataDir::create_or_load()?;
    log::info!("Data directory is {:?}", directories.get_root_ref());

    let preferences = sync(Preferences::load(directories.get_root_ref()));
    let cache = LyricsCache::new(directories.get_root_ref())?;
    log::info!("{} lyrics in the cache", cache.len()?);

    let mut fetcher = LyricsFetcher::new(Provider::all())?;
    let fetches = fetcher.take_receiver().ok_or_else(|| anyhow!("lyrics fetcher has no receiver"))?;

    // Optional `Artist - Title.ext` to play on the built in clock
    let mut player = ClockPlayer::new();
    if let Some(path) = std::env::args_os().nth(1) {
        let track = Track::from_path(Path::new(&path));
        log::info!("Playing {track}");
        player.load(track);
    }

    let bus = EventBus::new();
    let events = bus.subscribe();

    let coordinator = Coordinator::new(Services {
        player: Box::new(player),
        search: Box::new(fetcher),
        cache,
        preferences: preferences.clone(),
        bus
    });

    iced::application("Lyricbar", Application::update, Application::view)
        .subscription(Application::subscription)
        .window(window::Settings {
            size: Size::new(720.0, 160.0),
            decorations: false,
            transparent: true,
            level: window::Level::AlwaysOnTop,
            ..window::Settings::default()
        })
        .transparent(true)
        .theme(|_| Theme::Dark)
        .run_with(move || Application::new(coordinator, preferences, directories, events, fetches))?;

    Ok(())
}
