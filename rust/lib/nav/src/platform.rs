//! Host-platform seams: launch-URL query, URL events and the back button.
//!
//! Bindings for a real platform implement [`LinkingPlatform`] and
//! [`BackHandler`]. [`MemoryPlatform`] and [`MemoryBackHandler`] are
//! in-process versions for the CLI, tests and headless hosts.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::error::LinkingError;
use crate::store::SubscriptionId;

/// A boxed, `Send`-able future returned by platform queries.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Receives URLs that arrive while the app is running.
pub type UrlListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Back-button handler. Returns `true` if it consumed the event.
pub type BackListener = Arc<dyn Fn() -> bool + Send + Sync>;

pub trait LinkingPlatform: Send + Sync {
    /// The URL that launched the app, if any. May never resolve.
    fn initial_url(&self) -> BoxFuture<'_, Result<Option<String>, LinkingError>>;

    fn subscribe(&self, listener: UrlListener) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

pub trait BackHandler: Send + Sync {
    fn subscribe(&self, listener: BackListener) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

// ── Listener registry ──

struct Listeners<L> {
    entries: RwLock<Vec<(SubscriptionId, L)>>,
    next_id: AtomicU64,
}

impl<L: Clone> Listeners<L> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn add(&self, listener: L) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    fn remove(&self, id: SubscriptionId) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(lid, _)| *lid != id);
    }

    /// Snapshot, newest first.
    fn snapshot(&self) -> Vec<L> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .map(|(_, l)| l.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

// ── MemoryPlatform ──

/// How [`MemoryPlatform`] answers the launch-URL query.
#[derive(Debug, Clone)]
pub enum InitialUrl {
    /// Settle immediately.
    Ready(Option<String>),
    /// Settle after a delay.
    Delayed(Duration, Option<String>),
    /// Fail immediately.
    Fail(String),
    /// Never settle.
    Never,
}

pub struct MemoryPlatform {
    initial: InitialUrl,
    listeners: Listeners<UrlListener>,
}

impl MemoryPlatform {
    pub fn new(initial: InitialUrl) -> Self {
        Self {
            initial,
            listeners: Listeners::new(),
        }
    }

    /// A platform that was launched by `url`.
    pub fn launched_with(url: impl Into<String>) -> Self {
        Self::new(InitialUrl::Ready(Some(url.into())))
    }

    /// Deliver a URL to every subscriber, newest first.
    pub fn open_url(&self, url: &str) {
        for listener in self.listeners.snapshot() {
            listener(url);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl LinkingPlatform for MemoryPlatform {
    fn initial_url(&self) -> BoxFuture<'_, Result<Option<String>, LinkingError>> {
        let initial = self.initial.clone();
        Box::pin(async move {
            match initial {
                InitialUrl::Ready(url) => Ok(url),
                InitialUrl::Delayed(delay, url) => {
                    tokio::time::sleep(delay).await;
                    Ok(url)
                }
                InitialUrl::Fail(reason) => Err(LinkingError::Platform(reason)),
                InitialUrl::Never => std::future::pending().await,
            }
        })
    }

    fn subscribe(&self, listener: UrlListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }
}

// ── MemoryBackHandler ──

/// Back-button source that offers each press to the newest handler first.
pub struct MemoryBackHandler {
    listeners: Listeners<BackListener>,
}

impl MemoryBackHandler {
    pub fn new() -> Self {
        Self {
            listeners: Listeners::new(),
        }
    }

    /// Simulate a press. Returns `false` when no handler consumed it and
    /// the platform default (e.g. exiting) would run.
    pub fn press(&self) -> bool {
        self.listeners.snapshot().into_iter().any(|handler| handler())
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for MemoryBackHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl BackHandler for MemoryBackHandler {
    fn subscribe(&self, listener: BackListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }
}
