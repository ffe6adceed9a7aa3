use std::fs::read_to_string;

use crate::backend::database::LyricsCache;
use crate::backend::document::LyricsDocument;
use crate::backend::document::LyricsSource;
use crate::backend::events::EventBus;
use crate::backend::events::LyricsEvent;
use crate::backend::events::LyricsSummary;
use crate::backend::events::PositionEvent;
use crate::backend::lyrics::LyricsSearch;
use crate::backend::lrc::MAX_OFFSET;
use crate::backend::lyrics::SearchRequest;
use crate::backend::music::MusicPlayer;
use crate::backend::music::PlaybackState;
use crate::backend::music::Track;
use crate::backend::settings::Preferences;
use crate::backend::util::AM;
use crate::backend::util::desync;

/// Everything the coordinator talks to, handed over at construction.
pub struct Services {
    pub player: Box<dyn MusicPlayer>,
    pub search: Box<dyn LyricsSearch>,
    pub cache: LyricsCache,
    pub preferences: AM<Preferences>,
    pub bus: EventBus
}

/// What the player looked like at the last poll.
#[derive(Debug, Clone, PartialEq)]
struct PlayerSnapshot {
    track_id: Option<String>,
    state: PlaybackState,
    running: bool
}

/// Owns the current lyrics and turns player activity into position events.
pub struct Coordinator {
    services: Services,
    current: Option<LyricsDocument>,
    watched: PlayerSnapshot
}

impl Coordinator {
    pub fn new(services: Services) -> Self {
        let watched = PlayerSnapshot { track_id: None, state: PlaybackState::Stopped, running: true };
        Self { services, current: None, watched }
    }

    #[cfg(test)]
    pub fn current_lyrics(&self) -> Option<&LyricsDocument> { self.current.as_ref() }

    /// The next poll picks up the new playback state.
    pub fn toggle_playback(&mut self) { self.services.player.toggle_playback() }

    /// Move the player by `delta` seconds and publish the new position right away.
    pub fn seek_by(&mut self, delta: f64) {
        let position = match self.services.player.position() {
            Some(position) => position,
            None => return
        };
        self.services.player.seek((position + delta).max(0.0));
        self.tick();
    }

    fn summary(&self) -> Option<LyricsSummary> {
        self.current.as_ref().map(|document| LyricsSummary {
            title: document.metadata.title.clone(),
            artist: document.metadata.artist.clone(),
            source: document.metadata.source,
            offset: document.offset,
            lines: document.lines.len()
        })
    }

    fn publish(&self, event: LyricsEvent) { self.services.bus.publish(event) }

    fn publish_empty_position(&self) {
        let playing = self.services.player.playback_state().is_playing();
        self.publish(LyricsEvent::PositionChanged(PositionEvent::empty(playing)));
    }

    /// Replace the current document. Every path that changes the lyrics goes through here.
    fn set_current(&mut self, document: Option<LyricsDocument>) {
        self.current = document.map(|mut document| {
            let keys = desync(&self.services.preferences).filter_keys.clone();
            document.filtrate(&keys);
            document
        });

        self.publish(LyricsEvent::LyricsChanged(self.summary()));

        match self.current.as_ref() {
            Some(document) => {
                log::info!(
                    "Showing {} lines from {} for \"{}\"",
                    document.lines.len(), document.metadata.source.name(), document.metadata.title
                );
                if document.metadata.source != LyricsSource::Local {
                    if let Err(e) = self.services.cache.save(document) {
                        log::warn!("Could not cache lyrics: {e}");
                    }
                }
            }
            None => self.publish_empty_position()
        }
    }

    /// The player moved on to another track (or to nothing).
    pub fn current_track_changed(&mut self, track: Option<Track>) {
        self.set_current(None);

        let track = match track {
            Some(track) => track,
            None => return
        };
        log::info!("Track changed to {track}");

        let (skip, beside_track) = {
            let preferences = desync(&self.services.preferences);
            (preferences.skips_search(&track.id), preferences.load_lyrics_beside_track)
        };
        if skip {
            log::debug!("Not searching for {}", track.id);
            return;
        }

        let title = track.title().to_string();
        let artist = track.artist().to_string();

        if beside_track {
            if let Some(mut document) = Self::load_beside_track(&track) {
                document.identify(&title, &artist);
                self.set_current(Some(document));
                return;
            }
        }

        match self.services.cache.load(&title, &artist) {
            Ok(Some(document)) => {
                self.set_current(Some(document));
                return;
            }
            Ok(None) => {}
            Err(e) => log::warn!("Lyrics cache lookup failed: {e}")
        }

        self.services.search.search(SearchRequest { title, artist, duration: track.duration() });
    }

    fn load_beside_track(track: &Track) -> Option<LyricsDocument> {
        let path = track.lyrics_path()?;
        let contents = read_to_string(&path).ok()?;
        let document = LyricsDocument::from_lrc(&contents, LyricsSource::Local);
        if document.is_none() {
            log::debug!("Skipping malformed lyrics file {path:?}");
        }
        document
    }

    /// Start over with whatever the player has loaded, without waiting for a poll to notice it.
    pub fn current_player_changed(&mut self) {
        let track = self.services.player.current_track();
        self.watched.track_id = track.as_ref().map(|track| track.id.clone());
        self.current_track_changed(track);
    }

    /// Compare the player with the last poll, react to whatever changed, then publish the position.
    /// Returns true when the application should quit.
    pub fn poll(&mut self) -> bool {
        let running = self.services.player.is_running();
        if running != self.watched.running {
            self.watched.running = running;
            if self.running_state_changed(running) {
                return true;
            }
        }

        let track = self.services.player.current_track();
        let track_id = track.as_ref().map(|track| track.id.clone());
        if track_id != self.watched.track_id {
            self.watched.track_id = track_id;
            self.current_track_changed(track);
        }

        let state = self.services.player.playback_state();
        if state != self.watched.state {
            self.watched.state = state;
            log::debug!("Playback is now {state:?}");
            self.playback_state_changed(state);
        }

        self.tick();
        false
    }

    /// Whether `candidate` should take the place of `current`.
    pub fn should_replace(preferences: &Preferences, current: &LyricsDocument, candidate: &LyricsDocument) -> bool {
        let current_preferred = preferences.is_preferred(current.metadata.source);
        let candidate_preferred = preferences.is_preferred(candidate.metadata.source);
        if current_preferred != candidate_preferred {
            return candidate_preferred;
        }
        candidate.is_better_than(current)
    }

    /// A search result arrived. It only counts if it is for the track playing right now.
    pub fn lyrics_received(&mut self, candidate: LyricsDocument) {
        let track = self.services.player.current_track().unwrap_or_default();
        if !candidate.matches(track.title(), track.artist()) {
            log::debug!("Ignoring lyrics for \"{}\", no longer playing", candidate.metadata.title);
            return;
        }

        if let Some(current) = self.current.as_ref() {
            let preferences = desync(&self.services.preferences);
            if !Self::should_replace(&preferences, current, &candidate) {
                log::debug!("Keeping current lyrics over {} candidate", candidate.metadata.source.name());
                return;
            }
        }

        self.set_current(Some(candidate));
    }

    pub fn fetch_completed(&mut self, request: &SearchRequest) {
        log::debug!("Search finished for {request}");
        if desync(&self.services.preferences).write_to_player_automatically {
            self.write_to_player(true);
        }
    }

    /// Copy the current lyrics into the player's own lyrics field.
    pub fn write_to_player(&mut self, overwrite: bool) -> bool {
        let document = match self.current.as_ref() {
            Some(document) => document,
            None => return false
        };

        if !overwrite && self.services.player.embedded_lyrics().is_some() {
            return false;
        }

        let with_translation = desync(&self.services.preferences).write_with_translation;
        let text = document.embedded_text(with_translation);
        self.services.player.set_embedded_lyrics(text)
    }

    /// Poll the player and publish where it is.
    pub fn tick(&mut self) {
        if let Some(position) = self.services.player.position() {
            self.position_changed(position);
        }
    }

    pub fn position_changed(&mut self, position: f64) {
        let document = match self.current.as_ref() {
            Some(document) => document,
            None => return
        };

        let indices = document.resolve(position);
        let event = PositionEvent {
            position,
            indices,
            current: indices.current.map(|index| document.lines[index].clone()),
            next: indices.next.map(|index| document.lines[index].clone()),
            playing: self.services.player.playback_state().is_playing()
        };
        self.publish(LyricsEvent::PositionChanged(event));
    }

    pub fn playback_state_changed(&mut self, state: PlaybackState) {
        if !state.is_playing() && desync(&self.services.preferences).disable_lyrics_when_paused {
            self.publish_empty_position();
        }
    }

    /// Returns true when the application should quit along with the player.
    pub fn running_state_changed(&mut self, is_running: bool) -> bool {
        !is_running && desync(&self.services.preferences).launch_and_quit_with_player
    }

    pub fn offset(&self) -> i64 {
        self.current.as_ref().map(|document| document.offset).unwrap_or(0)
    }

    /// Change the user offset and write it through to the cache straight away.
    pub fn set_offset(&mut self, offset: i64) {
        let offset = offset.clamp(-MAX_OFFSET, MAX_OFFSET);
        let document = match self.current.as_mut() {
            Some(document) => document,
            None => return
        };
        document.offset = offset;
        log::info!("Lyrics offset is now {offset} ms");

        if let Err(e) = self.services.cache.save(document) {
            log::warn!("Could not save lyrics offset: {e}");
        }
        self.publish(LyricsEvent::LyricsChanged(self.summary()));
    }

    pub fn adjust_offset(&mut self, delta: i64) {
        self.set_offset(self.offset().saturating_add(delta));
    }

    /// Use user supplied LRC text for the current track.
    pub fn import_lyrics(&mut self, text: &str) -> bool {
        let track = match self.services.player.current_track() {
            Some(track) => track,
            None => return false
        };
        let mut document = match LyricsDocument::from_lrc(text, LyricsSource::Import) {
            Some(document) => document,
            None => return false
        };
        document.identify(track.title(), track.artist());
        self.set_current(Some(document));
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use async_channel::Receiver;
    use tempfile::tempdir;

    use super::*;
    use crate::backend::document::LyricsLine;
    use crate::backend::util::sync;

    #[derive(Clone, Default)]
    struct FakePlayer {
        state: Rc<RefCell<FakeState>>
    }

    #[derive(Default)]
    struct FakeState {
        track: Option<Track>,
        playback: PlaybackState,
        position: Option<f64>,
        embedded: Option<String>,
        stopped: bool
    }

    impl MusicPlayer for FakePlayer {
        fn is_running(&self) -> bool { !self.state.borrow().stopped }
        fn current_track(&self) -> Option<Track> { self.state.borrow().track.clone() }
        fn playback_state(&self) -> PlaybackState { self.state.borrow().playback }
        fn position(&self) -> Option<f64> { self.state.borrow().position }
        fn seek(&mut self, position: f64) { self.state.borrow_mut().position = Some(position) }
        fn embedded_lyrics(&self) -> Option<String> { self.state.borrow().embedded.clone() }
        fn set_embedded_lyrics(&mut self, lyrics: String) -> bool {
            self.state.borrow_mut().embedded = Some(lyrics);
            true
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSearch {
        requests: Rc<RefCell<Vec<SearchRequest>>>
    }

    impl LyricsSearch for RecordingSearch {
        fn search(&self, request: SearchRequest) { self.requests.borrow_mut().push(request) }
    }

    struct Harness {
        coordinator: Coordinator,
        player: FakePlayer,
        search: RecordingSearch,
        preferences: AM<Preferences>,
        events: Receiver<LyricsEvent>
    }

    fn harness_with(cache: LyricsCache) -> Harness {
        let player = FakePlayer::default();
        let search = RecordingSearch::default();
        let preferences = sync(Preferences::default());
        let bus = EventBus::new();
        let events = bus.subscribe();
        let coordinator = Coordinator::new(Services {
            player: Box::new(player.clone()),
            search: Box::new(search.clone()),
            cache,
            preferences: preferences.clone(),
            bus
        });
        Harness { coordinator, player, search, preferences, events }
    }

    fn harness() -> Harness {
        harness_with(LyricsCache::in_memory().unwrap())
    }

    impl Harness {
        fn play(&self, track: Track) {
            let mut state = self.player.state.borrow_mut();
            state.track = Some(track);
            state.playback = PlaybackState::Playing;
            state.position = Some(0.0);
        }

        fn drain(&self) -> Vec<LyricsEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() { events.push(event) }
            events
        }

        fn last_position(&self) -> Option<PositionEvent> {
            self.drain().into_iter().rev().find_map(|event| match event {
                LyricsEvent::PositionChanged(position) => Some(position),
                _ => None
            })
        }
    }

    fn candidate(source: LyricsSource, title: &str, artist: &str) -> LyricsDocument {
        let mut document = LyricsDocument::new(vec![
            LyricsLine::new(1.0, "first"),
            LyricsLine::new(4.0, "second"),
            LyricsLine::new(8.0, "third")
        ], source);
        document.identify(title, artist);
        document
    }

    fn ranked(source: LyricsSource, tag_title: &str) -> LyricsDocument {
        let mut document = candidate(source, "Song", "Artist");
        document.tags.title = Some(tag_title.to_string());
        document.tags.artist = Some("Artist".to_string());
        document
    }

    #[test]
    fn track_change_clears_and_searches() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.current_track_changed(h.player.current_track());

        assert!(h.coordinator.current_lyrics().is_none());
        assert_eq!(h.last_position(), Some(PositionEvent::empty(true)));

        let requests = h.search.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].title, "Song");
        assert_eq!(requests[0].artist, "Artist");
    }

    #[test]
    fn missing_metadata_searches_with_empty_strings() {
        let mut h = harness();
        let track = Track { id: "7".to_string(), ..Track::default() };
        h.play(track.clone());
        h.coordinator.current_track_changed(Some(track));

        let requests = h.search.requests.borrow();
        assert_eq!(requests[0].title, "");
        assert_eq!(requests[0].artist, "");
    }

    #[test]
    fn no_track_does_nothing_after_clearing() {
        let mut h = harness();
        h.coordinator.current_track_changed(None);
        assert!(h.search.requests.borrow().is_empty());
        assert_eq!(h.drain(), vec![
            LyricsEvent::LyricsChanged(None),
            LyricsEvent::PositionChanged(PositionEvent::empty(false))
        ]);
    }

    #[test]
    fn excluded_track_ids_are_never_searched() {
        let mut h = harness();
        desync(&h.preferences).no_searching_track_ids = vec!["1".to_string()];
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.current_track_changed(h.player.current_track());
        assert!(h.search.requests.borrow().is_empty());
    }

    #[test]
    fn lyrics_file_beside_track_wins() {
        let directory = tempdir().unwrap();
        let audio = directory.path().join("Artist - Song.mp3");
        std::fs::write(directory.path().join("Artist - Song.lrc"), "[00:01.00]from disk\n").unwrap();

        let mut h = harness();
        let track = Track::from_path(&audio);
        h.play(track.clone());
        h.coordinator.current_track_changed(Some(track));

        let current = h.coordinator.current_lyrics().unwrap();
        assert_eq!(current.metadata.source, LyricsSource::Local);
        assert!(current.matches("Song", "Artist"));
        assert_eq!(current.lines[0].content, "from disk");
        assert!(h.search.requests.borrow().is_empty());
    }

    #[test]
    fn malformed_file_beside_track_falls_through_to_search() {
        let directory = tempdir().unwrap();
        let audio = directory.path().join("Artist - Song.mp3");
        std::fs::write(directory.path().join("Artist - Song.lrc"), "no timing here").unwrap();

        let mut h = harness();
        let track = Track::from_path(&audio);
        h.play(track.clone());
        h.coordinator.current_track_changed(Some(track));

        assert!(h.coordinator.current_lyrics().is_none());
        assert_eq!(h.search.requests.borrow().len(), 1);
    }

    #[test]
    fn file_beside_track_is_ignored_when_disabled() {
        let directory = tempdir().unwrap();
        let audio = directory.path().join("Artist - Song.mp3");
        std::fs::write(directory.path().join("Artist - Song.lrc"), "[00:01.00]from disk\n").unwrap();

        let mut h = harness();
        desync(&h.preferences).load_lyrics_beside_track = false;
        let track = Track::from_path(&audio);
        h.play(track.clone());
        h.coordinator.current_track_changed(Some(track));

        assert!(h.coordinator.current_lyrics().is_none());
        assert_eq!(h.search.requests.borrow().len(), 1);
    }

    #[test]
    fn cached_lyrics_skip_the_search() {
        let cache = LyricsCache::in_memory().unwrap();
        cache.save(&candidate(LyricsSource::Lrclib, "Song", "Artist")).unwrap();

        let mut h = harness_with(cache);
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.current_track_changed(h.player.current_track());

        assert_eq!(h.coordinator.current_lyrics().unwrap().metadata.source, LyricsSource::Local);
        assert!(h.search.requests.borrow().is_empty());
    }

    #[test]
    fn received_lyrics_are_cached() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.current_track_changed(h.player.current_track());
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));

        // Same track again: served from the cache, no second search
        h.coordinator.current_track_changed(h.player.current_track());
        assert_eq!(h.search.requests.borrow().len(), 1);
        assert!(h.coordinator.current_lyrics().is_some());
    }

    #[test]
    fn stale_candidates_are_ignored() {
        let mut h = harness();
        h.play(Track::new("2", "Other", "Artist"));
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));
        assert!(h.coordinator.current_lyrics().is_none());
    }

    #[test]
    fn preferred_source_beats_quality() {
        let mut h = harness();
        desync(&h.preferences).preferred_source = Some(LyricsSource::NetEase);
        h.play(Track::new("1", "Song", "Artist"));

        h.coordinator.lyrics_received(ranked(LyricsSource::NetEase, "Something else"));
        h.coordinator.lyrics_received(ranked(LyricsSource::Lrclib, "Song"));

        assert_eq!(h.coordinator.current_lyrics().unwrap().metadata.source, LyricsSource::NetEase);
    }

    #[test]
    fn preferred_source_replaces_better_document() {
        let mut h = harness();
        desync(&h.preferences).preferred_source = Some(LyricsSource::NetEase);
        h.play(Track::new("1", "Song", "Artist"));

        h.coordinator.lyrics_received(ranked(LyricsSource::Lrclib, "Song"));
        h.coordinator.lyrics_received(ranked(LyricsSource::NetEase, "Something else"));

        assert_eq!(h.coordinator.current_lyrics().unwrap().metadata.source, LyricsSource::NetEase);
    }

    #[test]
    fn equal_tier_needs_strictly_better_quality() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));

        h.coordinator.lyrics_received(ranked(LyricsSource::Lrclib, "Something else"));
        h.coordinator.lyrics_received(ranked(LyricsSource::NetEase, "Song"));
        assert_eq!(h.coordinator.current_lyrics().unwrap().metadata.source, LyricsSource::NetEase);

        // Same quality does not replace
        h.coordinator.lyrics_received(ranked(LyricsSource::Lrclib, "Song"));
        assert_eq!(h.coordinator.current_lyrics().unwrap().metadata.source, LyricsSource::NetEase);
    }

    #[test]
    fn replacement_never_lowers_the_ranking() {
        let preferences = Preferences { preferred_source: Some(LyricsSource::Lrclib), ..Preferences::default() };
        let titles = ["Song", "Song (Live)", "Nothing alike", "Sang", "Song - Remastered"];
        let sources = [LyricsSource::Lrclib, LyricsSource::NetEase];

        let rank = |document: &LyricsDocument| (
            preferences.is_preferred(document.metadata.source),
            document.quality()
        );

        let mut current: Option<LyricsDocument> = None;
        for title in titles {
            for source in sources {
                let candidate = ranked(source, title);
                let replace = match current.as_ref() {
                    Some(current) => Coordinator::should_replace(&preferences, current, &candidate),
                    None => true
                };
                if replace {
                    if let Some(previous) = current.as_ref() {
                        assert!(rank(&candidate) > rank(previous));
                    }
                    current = Some(candidate);
                }
            }
        }
    }

    #[test]
    fn tick_applies_offset() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));
        h.drain();

        h.player.state.borrow_mut().position = Some(3.5);
        h.coordinator.tick();
        let event = h.last_position().unwrap();
        assert_eq!(event.current_text(), "first");
        assert_eq!(event.next.unwrap().content, "second");
        assert!(event.playing);

        h.coordinator.set_offset(600);
        h.coordinator.tick();
        let event = h.last_position().unwrap();
        assert_eq!(event.indices.current, Some(1));
        assert_eq!(event.position, 3.5);
    }

    #[test]
    fn tick_without_lyrics_or_position_is_silent() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.tick();
        assert!(h.drain().is_empty());

        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));
        h.drain();
        h.player.state.borrow_mut().position = None;
        h.coordinator.tick();
        assert!(h.drain().is_empty());
    }

    #[test]
    fn offset_is_written_to_the_cache() {
        let directory = tempdir().unwrap();
        let mut h = harness_with(LyricsCache::new(directory.path()).unwrap());
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));

        h.coordinator.adjust_offset(100);
        h.coordinator.adjust_offset(100);
        assert_eq!(h.coordinator.offset(), 200);

        let cache = LyricsCache::new(directory.path()).unwrap();
        assert_eq!(cache.load("Song", "Artist").unwrap().unwrap().offset, 200);
    }

    #[test]
    fn offset_change_is_announced() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));
        h.drain();

        h.coordinator.adjust_offset(-300);
        let offsets: Vec<i64> = h.drain().into_iter().filter_map(|event| match event {
            LyricsEvent::LyricsChanged(Some(summary)) => Some(summary.offset),
            _ => None
        }).collect();
        assert_eq!(offsets, vec![-300]);
    }

    #[test]
    fn huge_imported_offset_is_clamped_and_adjusts() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        assert!(h.coordinator.import_lyrics("[offset:9223372036854775807]\n[00:01.00]x"));
        assert_eq!(h.coordinator.offset(), MAX_OFFSET);

        h.coordinator.adjust_offset(100);
        assert_eq!(h.coordinator.offset(), MAX_OFFSET);
        h.coordinator.adjust_offset(-100);
        assert_eq!(h.coordinator.offset(), MAX_OFFSET - 100);

        h.coordinator.set_offset(i64::MIN);
        assert_eq!(h.coordinator.offset(), -MAX_OFFSET);
        h.coordinator.adjust_offset(i64::MIN);
        assert_eq!(h.coordinator.offset(), -MAX_OFFSET);
    }

    #[test]
    fn seeking_publishes_the_new_position() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));
        h.player.state.borrow_mut().position = Some(1.5);
        h.drain();

        h.coordinator.seek_by(5.0);
        assert_eq!(h.player.position(), Some(6.5));
        assert_eq!(h.last_position().unwrap().current_text(), "second");

        h.coordinator.seek_by(-30.0);
        assert_eq!(h.player.position(), Some(0.0));
        assert_eq!(h.last_position().unwrap().current, None);
    }

    #[test]
    fn offset_without_lyrics_is_zero() {
        let mut h = harness();
        h.coordinator.set_offset(500);
        assert_eq!(h.coordinator.offset(), 0);
    }

    #[test]
    fn credit_lines_are_filtered_on_arrival() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        let mut document = candidate(LyricsSource::NetEase, "Song", "Artist");
        document.lines.insert(0, LyricsLine::new(0.0, "作词：someone"));
        h.coordinator.lyrics_received(document);
        assert_eq!(h.coordinator.current_lyrics().unwrap().lines.len(), 3);
    }

    #[test]
    fn pausing_clears_surfaces_when_configured() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.player.state.borrow_mut().playback = PlaybackState::Paused;

        h.coordinator.playback_state_changed(PlaybackState::Paused);
        assert_eq!(h.last_position(), Some(PositionEvent::empty(false)));

        desync(&h.preferences).disable_lyrics_when_paused = false;
        h.coordinator.playback_state_changed(PlaybackState::Paused);
        assert!(h.drain().is_empty());
    }

    #[test]
    fn quits_with_player_only_when_asked() {
        let mut h = harness();
        assert!(!h.coordinator.running_state_changed(false));
        desync(&h.preferences).launch_and_quit_with_player = true;
        assert!(h.coordinator.running_state_changed(false));
        assert!(!h.coordinator.running_state_changed(true));
    }

    #[test]
    fn import_uses_current_track_identity() {
        let mut h = harness();
        assert!(!h.coordinator.import_lyrics("[00:01.00]mine"));

        h.play(Track::new("1", "Song", "Artist"));
        assert!(!h.coordinator.import_lyrics("not lyrics"));
        assert!(h.coordinator.import_lyrics("[00:01.00]mine"));

        let current = h.coordinator.current_lyrics().unwrap();
        assert_eq!(current.metadata.source, LyricsSource::Import);
        assert!(current.matches("Song", "Artist"));
    }

    #[test]
    fn completed_fetch_writes_to_player_when_enabled() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));
        let request = SearchRequest { title: "Song".to_string(), artist: "Artist".to_string(), duration: 0.0 };

        h.coordinator.fetch_completed(&request);
        assert!(h.player.embedded_lyrics().is_none());

        desync(&h.preferences).write_to_player_automatically = true;
        h.coordinator.fetch_completed(&request);
        assert_eq!(h.player.embedded_lyrics().as_deref(), Some("first\nsecond\nthird\n"));
    }

    #[test]
    fn writing_without_overwrite_keeps_existing_text() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.player.state.borrow_mut().embedded = Some("theirs".to_string());
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));

        assert!(!h.coordinator.write_to_player(false));
        assert_eq!(h.player.embedded_lyrics().as_deref(), Some("theirs"));
        assert!(h.coordinator.write_to_player(true));
    }

    #[test]
    fn polling_notices_new_tracks_once() {
        let mut h = harness();
        assert!(!h.coordinator.poll());
        assert!(h.search.requests.borrow().is_empty());

        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.poll();
        h.coordinator.poll();
        assert_eq!(h.search.requests.borrow().len(), 1);

        h.play(Track::new("2", "Other", "Artist"));
        h.coordinator.poll();
        assert_eq!(h.search.requests.borrow().len(), 2);
    }

    #[test]
    fn polling_publishes_positions() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.poll();
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));
        h.drain();

        h.player.state.borrow_mut().position = Some(8.5);
        h.coordinator.poll();
        assert_eq!(h.last_position().unwrap().current_text(), "third");
    }

    #[test]
    fn polling_quits_when_the_player_stops_running() {
        let mut h = harness();
        desync(&h.preferences).launch_and_quit_with_player = true;
        assert!(!h.coordinator.poll());

        h.player.state.borrow_mut().stopped = true;
        assert!(h.coordinator.poll());
    }

    #[test]
    fn player_change_adopts_its_track() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.current_player_changed();
        h.coordinator.poll();
        assert_eq!(h.search.requests.borrow().len(), 1);
    }

    #[test]
    fn lyrics_change_is_announced() {
        let mut h = harness();
        h.play(Track::new("1", "Song", "Artist"));
        h.coordinator.lyrics_received(candidate(LyricsSource::Lrclib, "Song", "Artist"));

        assert_eq!(h.drain(), vec![LyricsEvent::LyricsChanged(Some(LyricsSummary {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            source: LyricsSource::Lrclib,
            offset: 0,
            lines: 3
        }))]);
    }
}
