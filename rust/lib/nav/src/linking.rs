//! `link_to`: the capability descendants use to follow an in-app link.
//!
//! The root builds one [`LinkDispatcher`] per mount and hands out clones of
//! the same `Arc`, so its identity never changes. Options live behind an
//! [`OptionsCell`] that the root replaces on reconfiguration; every call
//! loads the cell at call time.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use crate::action::state_to_action;
use crate::config::LinkingOptions;
use crate::error::LinkingError;
use crate::path::{path_to_state, state_to_path};
use crate::state::NavigationState;
use crate::store::NavigationContainer;

/// Context value exposed to descendants.
pub type LinkingContext = Arc<LinkDispatcher>;

/// Latest-value cell for linking options.
pub struct OptionsCell {
    current: ArcSwap<LinkingOptions>,
}

impl OptionsCell {
    pub fn new(options: LinkingOptions) -> Self {
        Self {
            current: ArcSwap::from_pointee(options),
        }
    }

    /// Current options. Lock-free; an `Arc` snapshot.
    pub fn load(&self) -> Arc<LinkingOptions> {
        self.current.load_full()
    }

    pub fn store(&self, options: LinkingOptions) {
        self.current.store(Arc::new(options));
    }
}

/// What `link_to` did with a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The path matched no screen; nothing was sent to the container.
    Ignored,
    /// One incremental action was dispatched.
    Dispatched,
    /// An action was dispatched but no navigator handled it.
    Unhandled,
    /// The root state was replaced.
    Reset,
}

pub struct LinkDispatcher {
    options: Arc<OptionsCell>,
    container: Arc<dyn NavigationContainer>,
}

impl LinkDispatcher {
    pub fn new(options: Arc<OptionsCell>, container: Arc<dyn NavigationContainer>) -> Self {
        Self { options, container }
    }

    /// Navigate to `path` (a full URL with a known prefix, or an in-app path).
    ///
    /// Unmatched paths are a no-op. A matched state is reached with one
    /// `dispatch` when an incremental action exists, otherwise with one
    /// `reset_root`.
    pub fn link_to(&self, path: &str) -> LinkOutcome {
        let options = self.options.load();

        let Some(state) = path_to_state(path, &options) else {
            debug!(path, "link matched no screen");
            return LinkOutcome::Ignored;
        };

        let current = self.container.root_state();
        match state_to_action(&state, current.as_ref(), &options) {
            Some(action) => {
                debug!(path, ?action, "dispatching link action");
                if self.container.dispatch(action) {
                    LinkOutcome::Dispatched
                } else {
                    debug!(path, "link action not handled");
                    LinkOutcome::Unhandled
                }
            }
            None => {
                debug!(path, "no incremental action for link, resetting root");
                self.container.reset_root(state);
                LinkOutcome::Reset
            }
        }
    }

    /// Path for a state under the current options, e.g. to build an href.
    pub fn path_for(&self, state: &NavigationState) -> Result<String, LinkingError> {
        state_to_path(state, &self.options.load())
    }

    /// Options as of now.
    pub fn options(&self) -> Arc<LinkingOptions> {
        self.options.load()
    }
}
