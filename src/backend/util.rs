use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_channel::Receiver;
use iced::futures::Stream;
use iced::futures::StreamExt;

pub type AM<T> = Arc<Mutex<T>>;

pub fn sync<T>(obj: T) -> AM<T> { Arc::new(Mutex::new(obj)) }

/// Lock a shared object. A poisoned lock still hands out the inner value, there is nothing to recover.
pub fn desync<T>(obj: &AM<T>) -> MutexGuard<'_, T> {
    obj.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Turns the receiving end of a worker channel into a stream of application messages.
pub struct Relay;

impl Relay {
    pub fn consume_receiver<T, M, F>(receiver: Receiver<T>, f: F) -> impl Stream<Item = M>
    where
        T: Send + 'static,
        F: Fn(T) -> M + Send + 'static
    {
        receiver.map(f)
    }
}

/// Lower-case and collapse whitespace so that titles from different sources compare sensibly.
pub fn normalise(string: &str) -> String {
    string
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<String>>()
        .join(" ")
}
