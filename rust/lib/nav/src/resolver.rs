//! Initial-state resolution: `Pending -> Resolved`, exactly once.
//!
//! With deep linking enabled the resolver asks the platform for the launch
//! URL and races that query against a timer. Whichever settles first
//! decides; the other future is dropped, so a late URL is discarded. The
//! derived state (or the caller's fallback) is committed before readiness
//! flips, so the first render after readiness sees it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::linking::OptionsCell;
use crate::path::path_to_state;
use crate::platform::LinkingPlatform;
use crate::state::NavigationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverPhase {
    Pending,
    Resolved,
}

/// How resolution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Linking is off; the caller's state was used as is.
    Disabled,
    /// The platform reported a launch URL before the timer fired.
    Link(String),
    /// The platform reported no launch URL.
    NoLink,
    /// The timer fired first.
    TimedOut,
    /// The platform query failed.
    Failed(String),
    /// The owner went away before the race settled.
    Abandoned,
}

pub struct InitialStateResolver {
    /// Caller-supplied state, used when no link produces one.
    fallback: Option<NavigationState>,
    /// Committed initial state. Written once, before readiness.
    initial: RwLock<Option<NavigationState>>,
    resolution: RwLock<Option<Resolution>>,
    ready: watch::Sender<bool>,
    started: AtomicBool,
    committed: AtomicBool,
    timeout: Duration,
}

impl InitialStateResolver {
    /// Create a resolver. When `enabled` is false it starts `Resolved` with
    /// `initial_state` committed and never waits on anything.
    pub fn new(
        enabled: bool,
        initial_state: Option<NavigationState>,
        config: &ResolverConfig,
    ) -> Self {
        let (ready, _) = watch::channel(!enabled);
        let (initial, fallback, resolution) = if enabled {
            (None, initial_state, None)
        } else {
            (initial_state, None, Some(Resolution::Disabled))
        };
        Self {
            fallback,
            initial: RwLock::new(initial),
            resolution: RwLock::new(resolution),
            ready,
            started: AtomicBool::new(!enabled),
            committed: AtomicBool::new(!enabled),
            timeout: config.initial_url_timeout,
        }
    }

    pub fn phase(&self) -> ResolverPhase {
        if self.is_ready() {
            ResolverPhase::Resolved
        } else {
            ResolverPhase::Pending
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// The committed initial state. `None` while pending.
    pub fn initial_state(&self) -> Option<NavigationState> {
        self.initial
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Readiness as a watch channel; the value goes `false -> true` once.
    pub fn subscribe_ready(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    /// Wait until resolved. Returns immediately when already resolved.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Run the launch-URL race and commit the outcome.
    ///
    /// Only the first call does any work; later calls return the stored
    /// resolution once it exists (or `None` while the first is running).
    /// Errors from the platform are logged and treated as "no link".
    pub async fn resolve(
        &self,
        platform: &dyn LinkingPlatform,
        options: &OptionsCell,
    ) -> Option<Resolution> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return self.resolution();
        }

        let outcome = tokio::select! {
            biased;
            res = platform.initial_url() => match res {
                Ok(Some(url)) => Resolution::Link(url),
                Ok(None) => Resolution::NoLink,
                Err(e) => {
                    warn!("initial link query failed: {e}");
                    Resolution::Failed(e.to_string())
                }
            },
            _ = tokio::time::sleep(self.timeout) => {
                debug!(timeout = ?self.timeout, "initial link query timed out");
                Resolution::TimedOut
            }
        };

        // Options are read after the race so a reconfiguration during the
        // wait is honored.
        let derived = match &outcome {
            Resolution::Link(url) => {
                let state = path_to_state(url, &options.load());
                if state.is_none() {
                    info!(url = %url, "launch link matched no screen");
                }
                state
            }
            _ => None,
        };

        if self.commit(derived.or_else(|| self.fallback.clone()), outcome.clone()) {
            Some(outcome)
        } else {
            self.resolution()
        }
    }

    /// Resolve now with the fallback state, if nothing has been committed.
    ///
    /// Used when the race is cancelled, so `wait_ready` never hangs.
    /// Returns `false` if a resolution was already committed.
    pub fn abandon(&self) -> bool {
        let committed = self.commit(self.fallback.clone(), Resolution::Abandoned);
        if committed {
            debug!("initial state resolution abandoned, using fallback");
        }
        committed
    }

    /// Store the outcome and flip readiness. Only the first commit counts.
    fn commit(&self, state: Option<NavigationState>, outcome: Resolution) -> bool {
        if self.committed.swap(true, Ordering::AcqRel) {
            return false;
        }
        *self.initial.write().unwrap_or_else(PoisonError::into_inner) = state;
        *self.resolution.write().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        self.ready.send_replace(true);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LinkingConfig, LinkingOptions};
    use crate::platform::{InitialUrl, MemoryPlatform};
    use crate::state::Route;
    use serde_json::json;

    fn cell() -> OptionsCell {
        OptionsCell::new(
            LinkingOptions::new(["myapp://"]).with_config(
                LinkingConfig::from_json_str(r#"{"screens": {"Profile": "user/:id"}}"#).unwrap(),
            ),
        )
    }

    fn fallback() -> NavigationState {
        NavigationState::new(vec![Route::new("Home")])
    }

    fn resolver(enabled: bool) -> InitialStateResolver {
        InitialStateResolver::new(enabled, Some(fallback()), &ResolverConfig::default())
    }

    // ========================================================================
    // Disabled
    // ========================================================================

    #[test]
    fn disabled_is_ready_immediately_with_caller_state() {
        let r = resolver(false);
        assert!(r.is_ready());
        assert_eq!(r.phase(), ResolverPhase::Resolved);
        assert_eq!(r.initial_state(), Some(fallback()));
        assert_eq!(r.resolution(), Some(Resolution::Disabled));
    }

    #[tokio::test]
    async fn disabled_resolve_does_not_query() {
        let r = resolver(false);
        let p = MemoryPlatform::launched_with("myapp://user/1");
        assert_eq!(r.resolve(&p, &cell()).await, Some(Resolution::Disabled));
        assert_eq!(r.initial_state(), Some(fallback()));
    }

    // ========================================================================
    // Enabled
    // ========================================================================

    #[test]
    fn enabled_starts_pending_without_state() {
        let r = resolver(true);
        assert!(!r.is_ready());
        assert_eq!(r.phase(), ResolverPhase::Pending);
        assert_eq!(r.initial_state(), None);
    }

    #[tokio::test]
    async fn link_before_timeout_becomes_initial_state() {
        let r = resolver(true);
        let p = MemoryPlatform::launched_with("myapp://user/42");

        let outcome = r.resolve(&p, &cell()).await;
        assert_eq!(outcome, Some(Resolution::Link("myapp://user/42".into())));
        assert!(r.is_ready());
        let state = r.initial_state().unwrap();
        assert_eq!(state.routes[0].name, "Profile");
        assert_eq!(state.routes[0].param("id"), Some(&json!("42")));
    }

    #[tokio::test(start_paused = true)]
    async fn never_settling_query_times_out_to_fallback() {
        let r = resolver(true);
        let p = MemoryPlatform::new(InitialUrl::Never);
        let start = tokio::time::Instant::now();

        let outcome = r.resolve(&p, &cell()).await;
        assert_eq!(outcome, Some(Resolution::TimedOut));
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(150), "waited {waited:?}");
        assert!(waited < Duration::from_millis(200), "waited {waited:?}");
        assert!(r.is_ready());
        assert_eq!(r.initial_state(), Some(fallback()));
    }

    #[tokio::test(start_paused = true)]
    async fn late_link_is_discarded() {
        let r = resolver(true);
        let p = MemoryPlatform::new(InitialUrl::Delayed(
            Duration::from_millis(500),
            Some("myapp://user/1".into()),
        ));

        assert_eq!(r.resolve(&p, &cell()).await, Some(Resolution::TimedOut));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(r.initial_state(), Some(fallback()));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_configurable() {
        let r = InitialStateResolver::new(
            true,
            None,
            &ResolverConfig::with_timeout(Duration::from_secs(2)),
        );
        let p = MemoryPlatform::new(InitialUrl::Delayed(
            Duration::from_secs(1),
            Some("myapp://user/9".into()),
        ));

        assert!(matches!(r.resolve(&p, &cell()).await, Some(Resolution::Link(_))));
        assert_eq!(r.initial_state().unwrap().routes[0].name, "Profile");
    }

    #[tokio::test]
    async fn no_link_falls_back() {
        let r = resolver(true);
        let p = MemoryPlatform::new(InitialUrl::Ready(None));
        assert_eq!(r.resolve(&p, &cell()).await, Some(Resolution::NoLink));
        assert_eq!(r.initial_state(), Some(fallback()));
    }

    #[tokio::test]
    async fn unmatched_link_falls_back() {
        let r = resolver(true);
        let p = MemoryPlatform::launched_with("myapp://nowhere");
        assert!(matches!(r.resolve(&p, &cell()).await, Some(Resolution::Link(_))));
        assert_eq!(r.initial_state(), Some(fallback()));
    }

    #[tokio::test]
    async fn platform_error_is_absorbed() {
        let r = InitialStateResolver::new(true, None, &ResolverConfig::default());
        let p = MemoryPlatform::new(InitialUrl::Fail("activity gone".into()));

        let outcome = r.resolve(&p, &cell()).await;
        assert!(matches!(outcome, Some(Resolution::Failed(ref m)) if m.contains("activity gone")));
        assert!(r.is_ready());
        assert_eq!(r.initial_state(), None);
    }

    // ========================================================================
    // Abandon
    // ========================================================================

    #[tokio::test]
    async fn abandon_commits_fallback_and_releases_waiters() {
        let r = resolver(true);
        assert!(r.abandon());

        r.wait_ready().await;
        assert_eq!(r.initial_state(), Some(fallback()));
        assert_eq!(r.resolution(), Some(Resolution::Abandoned));
        assert!(!r.abandon());
    }

    #[tokio::test]
    async fn abandon_after_resolution_keeps_result() {
        let r = resolver(true);
        let p = MemoryPlatform::launched_with("myapp://user/3");
        r.resolve(&p, &cell()).await;

        assert!(!r.abandon());
        assert!(matches!(r.resolution(), Some(Resolution::Link(_))));
        assert_eq!(r.initial_state().unwrap().routes[0].param("id"), Some(&json!("3")));
    }

    #[tokio::test]
    async fn resolve_after_abandon_reports_abandoned() {
        let r = resolver(true);
        r.abandon();
        let p = MemoryPlatform::launched_with("myapp://user/3");

        assert_eq!(r.resolve(&p, &cell()).await, Some(Resolution::Abandoned));
        assert_eq!(r.initial_state(), Some(fallback()));
    }

    #[tokio::test]
    async fn resolves_only_once() {
        let r = resolver(true);
        let first = MemoryPlatform::launched_with("myapp://user/1");
        let second = MemoryPlatform::launched_with("myapp://user/2");

        r.resolve(&first, &cell()).await;
        assert_eq!(
            r.resolve(&second, &cell()).await,
            Some(Resolution::Link("myapp://user/1".into()))
        );
        assert_eq!(r.initial_state().unwrap().routes[0].param("id"), Some(&json!("1")));
    }

    #[tokio::test]
    async fn state_is_committed_before_readiness() {
        let r = std::sync::Arc::new(resolver(true));
        let mut rx = r.subscribe_ready();
        let waiter = {
            let r = r.clone();
            tokio::spawn(async move {
                let _ = rx.wait_for(|ready| *ready).await;
                r.initial_state()
            })
        };

        let p = MemoryPlatform::launched_with("myapp://user/5");
        r.resolve(&p, &cell()).await;
        let seen = waiter.await.unwrap().unwrap();
        assert_eq!(seen.routes[0].param("id"), Some(&json!("5")));
    }

    #[tokio::test]
    async fn wait_ready_returns_after_resolution() {
        let r = resolver(true);
        let p = MemoryPlatform::new(InitialUrl::Ready(None));
        let cell = cell();
        let (_, ()) = tokio::join!(r.resolve(&p, &cell), r.wait_ready());
        assert!(r.is_ready());
    }
}
