use std::fmt::Formatter;
use std::thread::JoinHandle;
use std::time::Duration;

use async_channel::Receiver;
use async_channel::Sender;
use async_channel::unbounded;

use reqwest::Client;
use tokio::runtime::Runtime;
use tokio::task::JoinSet;

use crate::backend::document::LyricsDocument;
use crate::backend::error::LyricbarError;
use crate::backend::providers::Provider;

const USER_AGENT: &str = concat!("lyricbar/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub title: String,
    pub artist: String,
    /// Seconds, zero when unknown
    pub duration: f64
}

impl std::fmt::Display for SearchRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "\"{}\" by \"{}\"", self.title, self.artist)
    }
}

#[derive(Debug, Clone)]
pub enum FetchEvent {
    Candidate(LyricsDocument),
    Completed(SearchRequest)
}

/// Something that can look for lyrics without blocking the caller.
/// Results come back out of band, there is no handle to cancel a search.
pub trait LyricsSearch {
    fn search(&self, request: SearchRequest);
}

/// Background thread running every provider for each request it is sent.
pub struct LyricsFetcher {
    _handle: JoinHandle<()>,
    sender: Sender<SearchRequest>,
    receiver: Option<Receiver<FetchEvent>>
}

impl LyricsFetcher {
    pub fn new(providers: Vec<Provider>) -> Result<Self, LyricbarError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (thread_sender, my_receiver) = unbounded();
        let (my_sender, thread_receiver) = unbounded();

        Ok(Self {
            _handle: std::thread::spawn(move || Self::run(runtime, client, providers, thread_sender, thread_receiver)),
            sender: my_sender,
            receiver: Some(my_receiver)
        })
    }

    fn run(runtime: Runtime, client: Client, providers: Vec<Provider>, sender: Sender<FetchEvent>, receiver: Receiver<SearchRequest>) {
        runtime.block_on(async move {
            while let Ok(request) = receiver.recv().await {
                log::info!("Searching lyrics for {request}");
                tokio::spawn(search_all(client.clone(), providers.clone(), request, sender.clone()));
            }
        });
        log::debug!("Lyrics fetcher stopped");
    }

    pub fn take_receiver(&mut self) -> Option<Receiver<FetchEvent>> {
        self.receiver.take()
    }
}

impl LyricsSearch for LyricsFetcher {
    fn search(&self, request: SearchRequest) {
        if let Err(e) = self.sender.try_send(request) {
            log::warn!("Lyrics fetcher is gone, dropping {}", e.into_inner());
        }
    }
}

/// Run every provider concurrently, forwarding candidates as soon as each provider answers.
async fn search_all(client: Client, providers: Vec<Provider>, request: SearchRequest, sender: Sender<FetchEvent>) {
    let mut tasks = JoinSet::new();
    for provider in providers {
        let client = client.clone();
        let request = request.clone();
        tasks.spawn(async move { (provider, provider.search(&client, &request).await) });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((provider, Ok(documents))) => {
                log::debug!("{} found {} candidates", provider.source().name(), documents.len());
                for document in documents {
                    let _ = sender.send(FetchEvent::Candidate(document)).await;
                }
            }
            Ok((provider, Err(e))) => log::warn!("{} search failed: {e}", provider.source().name()),
            Err(e) => log::warn!("Provider task died: {e}")
        }
    }

    let _ = sender.send(FetchEvent::Completed(request)).await;
}
