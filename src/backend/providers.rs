use reqwest::Client;
use serde::Deserialize;

use crate::backend::document::LyricsDocument;
use crate::backend::document::LyricsSource;
use crate::backend::error::LyricbarError;
use crate::backend::lrc::merge_translation;
use crate::backend::lyrics::SearchRequest;

const LRCLIB_SEARCH: &str = "https://lrclib.net/api/search";
const NETEASE_SEARCH: &str = "https://music.163.com/api/search/get";
const NETEASE_LYRIC: &str = "https://music.163.com/api/song/lyric";

/// Candidates kept per provider per request.
pub const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Lrclib,
    NetEase
}

impl Provider {
    pub fn all() -> Vec<Provider> { vec![Provider::Lrclib, Provider::NetEase] }

    pub fn source(&self) -> LyricsSource {
        match self {
            Provider::Lrclib => LyricsSource::Lrclib,
            Provider::NetEase => LyricsSource::NetEase
        }
    }

    pub async fn search(self, client: &Client, request: &SearchRequest) -> Result<Vec<LyricsDocument>, LyricbarError> {
        match self {
            Provider::Lrclib => search_lrclib(client, request).await,
            Provider::NetEase => search_netease(client, request).await
        }
    }
}

fn finish(mut document: LyricsDocument, request: &SearchRequest) -> LyricsDocument {
    document.identify(&request.title, &request.artist);
    document.metadata.search_duration = if request.duration > 0.0 { Some(request.duration) } else { None };
    document
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct LrclibEntry {
    track_name: Option<String>,
    artist_name: Option<String>,
    album_name: Option<String>,
    duration: Option<f64>,
    synced_lyrics: Option<String>
}

fn lrclib_documents(entries: Vec<LrclibEntry>, request: &SearchRequest) -> Vec<LyricsDocument> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let mut document = LyricsDocument::from_lrc(entry.synced_lyrics.as_deref()?, Provider::Lrclib.source())?;
            document.tags.title = document.tags.title.take().or(entry.track_name);
            document.tags.artist = document.tags.artist.take().or(entry.artist_name);
            document.tags.album = document.tags.album.take().or(entry.album_name);
            document.tags.length = document.tags.length.or(entry.duration);
            Some(finish(document, request))
        })
        .take(MAX_CANDIDATES)
        .collect()
}

async fn search_lrclib(client: &Client, request: &SearchRequest) -> Result<Vec<LyricsDocument>, LyricbarError> {
    let entries: Vec<LrclibEntry> = client
        .get(LRCLIB_SEARCH)
        .query(&[("track_name", request.title.as_str()), ("artist_name", request.artist.as_str())])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    log::debug!("LRCLIB returned {} entries for {}", entries.len(), request);
    Ok(lrclib_documents(entries, request))
}

#[derive(Deserialize, Debug)]
struct NeteaseSearch {
    result: Option<NeteaseResult>
}

#[derive(Deserialize, Debug)]
struct NeteaseResult {
    #[serde(default)]
    songs: Vec<NeteaseSong>
}

#[derive(Deserialize, Debug)]
struct NeteaseSong {
    id: u64,
    name: String,
    #[serde(default)]
    artists: Vec<NeteaseName>,
    album: Option<NeteaseName>,
    /// Milliseconds
    #[serde(default)]
    duration: u64
}

#[derive(Deserialize, Debug)]
struct NeteaseName {
    name: String
}

#[derive(Deserialize, Debug)]
struct NeteaseLyric {
    lrc: Option<NeteaseLyricText>,
    tlyric: Option<NeteaseLyricText>
}

#[derive(Deserialize, Debug)]
struct NeteaseLyricText {
    lyric: Option<String>
}

fn netease_document(song: &NeteaseSong, lyric: NeteaseLyric, request: &SearchRequest) -> Option<LyricsDocument> {
    let text = lyric.lrc.and_then(|lrc| lrc.lyric)?;
    let mut document = LyricsDocument::from_lrc(&text, Provider::NetEase.source())?;

    if let Some(translation) = lyric.tlyric.and_then(|tlyric| tlyric.lyric) {
        merge_translation(&mut document.lines, &translation);
    }

    document.tags.title = Some(song.name.clone());
    if !song.artists.is_empty() {
        document.tags.artist = Some(
            song.artists.iter().map(|artist| artist.name.as_str()).collect::<Vec<&str>>().join(", ")
        );
    }
    document.tags.album = song.album.as_ref().map(|album| album.name.clone());
    if song.duration > 0 {
        document.tags.length = Some(song.duration as f64 / 1000.0);
    }

    Some(finish(document, request))
}

async fn search_netease(client: &Client, request: &SearchRequest) -> Result<Vec<LyricsDocument>, LyricbarError> {
    let keywords = format!("{} {}", request.title, request.artist);
    let limit = MAX_CANDIDATES.to_string();
    let search: NeteaseSearch = client
        .get(NETEASE_SEARCH)
        .query(&[("s", keywords.as_str()), ("type", "1"), ("limit", limit.as_str())])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let songs = search.result.map(|result| result.songs).unwrap_or_default();
    let mut documents = Vec::new();

    for song in songs.iter().take(MAX_CANDIDATES) {
        let id = song.id.to_string();
        let lyric: NeteaseLyric = match client
            .get(NETEASE_LYRIC)
            .query(&[("id", id.as_str()), ("lv", "1"), ("tv", "-1")])
            .send()
            .await
        {
            Ok(response) => match response.json().await {
                Ok(lyric) => lyric,
                Err(e) => {
                    log::warn!("NetEase lyric {id} could not be decoded: {e}");
                    continue
                }
            },
            Err(e) => {
                log::warn!("NetEase lyric {id} failed: {e}");
                continue
            }
        };

        if let Some(document) = netease_document(song, lyric, request) {
            documents.push(document);
        }
    }

    Ok(documents)
}
