use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::action::NavigationAction;
use crate::reducer::{self, KeyGen};
use crate::state::NavigationState;

/// Callback type for state change notifications.
pub type StateListener = Arc<dyn Fn(&NavigationState) + Send + Sync>;

/// Unique handle for a listener or platform subscription.
///
/// Use this to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a registry-assigned id. Platform bindings implementing
    /// `LinkingPlatform` or `BackHandler` mint their ids with this.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// The navigation state container the root renders.
///
/// It owns the live state and is the single source of truth for it; the
/// root only hands it the one-shot initial state. `mount` must accept
/// `None`.
pub trait NavigationContainer: Send + Sync {
    /// Called once, when the root first renders the navigator.
    fn mount(&self, initial_state: Option<NavigationState>);

    /// Apply an action. Returns `false` if no navigator handled it.
    fn dispatch(&self, action: NavigationAction) -> bool;

    /// Replace the whole tree.
    fn reset_root(&self, state: NavigationState);

    /// Current root state, if any navigator has rendered yet.
    fn root_state(&self) -> Option<NavigationState>;

    fn can_go_back(&self) -> bool;

    fn go_back(&self) -> bool {
        self.dispatch(NavigationAction::GoBack)
    }

    /// Names along the focused route chain.
    fn active_route_path(&self) -> Vec<String> {
        self.root_state()
            .map(|s| s.active_route_path())
            .unwrap_or_default()
    }

    /// Observe every committed state.
    fn add_listener(&self, listener: StateListener) -> SubscriptionId;

    fn remove_listener(&self, id: SubscriptionId);
}

/// Default in-memory container backed by the stack reducer.
///
/// - `dispatch(action)` reduces and commits, notifying listeners.
/// - `reset_root(state)` commits `state` as is (keys filled in).
/// - `add_listener` / `remove_listener` manage change callbacks.
///
/// Listeners run synchronously on the committing thread, after the state
/// lock is released, so they may read the store.
pub struct NavigationStore {
    state: RwLock<Option<NavigationState>>,
    /// Screens the root navigator accepts. Empty accepts anything.
    route_names: Vec<String>,
    listeners: RwLock<Vec<(SubscriptionId, StateListener)>>,
    next_id: AtomicU64,
    keys: KeyGen,
}

impl NavigationStore {
    /// Create an empty store whose root accepts any screen.
    pub fn new() -> Self {
        Self::with_route_names(Vec::<String>::new())
    }

    /// Create an empty store whose root navigator only knows `names`.
    pub fn with_route_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: RwLock::new(None),
            route_names: names.into_iter().map(Into::into).collect(),
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            keys: KeyGen::new(),
        }
    }

    fn current(&self) -> Option<NavigationState> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store a new root state and notify listeners.
    fn commit(&self, mut next: NavigationState) {
        if next.route_names.is_empty() {
            next.route_names = self.route_names.clone();
        }
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = Some(next.clone());
        }
        let listeners: Vec<StateListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for NavigationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationContainer for NavigationStore {
    fn mount(&self, initial_state: Option<NavigationState>) {
        match initial_state {
            Some(state) => self.commit(reducer::assign_keys(state, &self.keys)),
            None => debug!("navigation store mounted without initial state"),
        }
    }

    fn dispatch(&self, action: NavigationAction) -> bool {
        let mut current = self.current();
        if let Some(state) = current.as_mut() {
            if state.route_names.is_empty() {
                state.route_names = self.route_names.clone();
            }
        }
        let base = current.or_else(|| {
            (!self.route_names.is_empty())
                .then(|| NavigationState::default().with_route_names(self.route_names.clone()))
        });

        match reducer::reduce(base.as_ref(), &action, &self.keys) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => {
                debug!(?action, "action not handled by any navigator");
                false
            }
        }
    }

    fn reset_root(&self, state: NavigationState) {
        self.commit(reducer::assign_keys(state, &self.keys));
    }

    fn root_state(&self) -> Option<NavigationState> {
        self.current()
    }

    fn can_go_back(&self) -> bool {
        self.current().as_ref().and_then(reducer::go_back).is_some()
    }

    fn add_listener(&self, listener: StateListener) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    fn remove_listener(&self, id: SubscriptionId) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(lid, _)| *lid != id);
    }
}
