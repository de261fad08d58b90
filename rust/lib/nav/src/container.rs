use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::NavigationAction;
use crate::config::{LinkingOptions, ResolverConfig};
use crate::linking::{LinkDispatcher, LinkingContext, OptionsCell};
use crate::platform::{BackHandler, LinkingPlatform};
use crate::resolver::{InitialStateResolver, Resolution, ResolverPhase};
use crate::state::NavigationState;
use crate::store::{NavigationContainer, StateListener, SubscriptionId};
use crate::theme::Theme;

/// Options accepted by [`NavigationRoot::mount`].
///
/// `V` is whatever the host renders while the initial state is pending.
pub struct RootOptions<V = ()> {
    /// Used as is when linking is off, and as the fallback when no launch
    /// link produces a state.
    pub initial_state: Option<NavigationState>,
    pub on_state_change: Option<StateListener>,
    pub theme: Theme,
    /// `None` or `enabled: false` turns off deep-link handling.
    pub linking: Option<LinkingOptions>,
    pub fallback: Option<V>,
    pub resolver: ResolverConfig,
}

impl<V> Default for RootOptions<V> {
    fn default() -> Self {
        Self {
            initial_state: None,
            on_state_change: None,
            theme: Theme::default(),
            linking: None,
            fallback: None,
            resolver: ResolverConfig::default(),
        }
    }
}

impl<V> RootOptions<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_state(mut self, state: NavigationState) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn with_linking(mut self, linking: LinkingOptions) -> Self {
        self.linking = Some(linking);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_fallback(mut self, fallback: V) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn on_state_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&NavigationState) + Send + Sync + 'static,
    {
        self.on_state_change = Some(Arc::new(f));
        self
    }
}

/// Result of [`NavigationRoot::render`].
pub enum Render<'a, V> {
    /// Initial state still pending: show the fallback (or nothing).
    Fallback(Option<&'a V>),
    Navigator(NavigatorView),
}

/// Everything the host needs to render the navigation tree.
pub struct NavigatorView {
    pub initial_state: Option<NavigationState>,
    pub theme: Theme,
    /// Context value for descendants. Same `Arc` on every render.
    pub linking: LinkingContext,
    pub handle: NavigationHandle,
}

/// Imperative handle on the navigation container.
///
/// The root hands out this one handle regardless of how the container is
/// wrapped, so callers never reach for the container directly.
#[derive(Clone)]
pub struct NavigationHandle {
    container: Arc<dyn NavigationContainer>,
}

impl NavigationHandle {
    pub fn dispatch(&self, action: NavigationAction) -> bool {
        self.container.dispatch(action)
    }

    pub fn reset_root(&self, state: NavigationState) {
        self.container.reset_root(state);
    }

    pub fn go_back(&self) -> bool {
        self.container.go_back()
    }

    pub fn can_go_back(&self) -> bool {
        self.container.can_go_back()
    }

    pub fn root_state(&self) -> Option<NavigationState> {
        self.container.root_state()
    }

    pub fn active_route_path(&self) -> Vec<String> {
        self.container.active_route_path()
    }
}

/// Root of a navigation tree wired to the platform's deep links and back
/// button.
///
/// - `mount` subscribes to the back button and, with linking enabled,
///   starts initial-state resolution in a background task.
/// - `render` returns the fallback until resolved, then the navigator.
/// - `set_linking` replaces the options `link_to` and URL events read.
/// - `unmount` (or drop) tears all subscriptions down.
///
/// # Examples
///
/// ```ignore
/// let root = NavigationRoot::mount(
///     RootOptions::<()>::new().with_linking(LinkingOptions::new(["myapp://"])),
///     store, platform, back,
/// );
/// root.ready().await;
/// if let Render::Navigator(view) = root.render() {
///     view.linking.link_to("/user/42");
/// }
/// ```
pub struct NavigationRoot<V = ()> {
    inner: Arc<RootInner>,
    fallback: Option<V>,
    back_sub: SubscriptionId,
    url_sub: Option<SubscriptionId>,
    state_sub: Option<SubscriptionId>,
    cancel: CancellationToken,
    unmounted: AtomicBool,
}

struct RootInner {
    resolver: InitialStateResolver,
    options: Arc<OptionsCell>,
    linking: LinkingContext,
    container: Arc<dyn NavigationContainer>,
    platform: Arc<dyn LinkingPlatform>,
    back: Arc<dyn BackHandler>,
    theme: RwLock<Theme>,
    enabled: bool,
    navigator_mounted: AtomicBool,
}

impl<V> NavigationRoot<V> {
    /// Mount the root.
    ///
    /// With linking enabled the launch-URL race runs on a task spawned on
    /// the current tokio runtime. Outside a runtime the race is skipped and
    /// the root resolves at once with `initial_state`.
    pub fn mount(
        options: RootOptions<V>,
        container: Arc<dyn NavigationContainer>,
        platform: Arc<dyn LinkingPlatform>,
        back: Arc<dyn BackHandler>,
    ) -> Self {
        let RootOptions {
            initial_state,
            on_state_change,
            theme,
            linking,
            fallback,
            resolver,
        } = options;

        let enabled = linking.as_ref().is_some_and(|l| l.enabled);
        let cell = Arc::new(OptionsCell::new(linking.unwrap_or_default()));
        let dispatcher: LinkingContext =
            Arc::new(LinkDispatcher::new(Arc::clone(&cell), Arc::clone(&container)));

        let inner = Arc::new(RootInner {
            resolver: InitialStateResolver::new(enabled, initial_state, &resolver),
            options: cell,
            linking: dispatcher,
            container: Arc::clone(&container),
            platform,
            back,
            theme: RwLock::new(theme),
            enabled,
            navigator_mounted: AtomicBool::new(false),
        });

        let back_sub = {
            let container = Arc::clone(&container);
            inner.back.subscribe(Arc::new(move || {
                if container.can_go_back() {
                    debug!("back press handled by navigator");
                    container.go_back()
                } else {
                    false
                }
            }))
        };

        let state_sub = on_state_change.map(|listener| container.add_listener(listener));

        let cancel = CancellationToken::new();
        let url_sub = if enabled {
            let weak = Arc::downgrade(&inner);
            let sub = inner
                .platform
                .subscribe(Arc::new(move |url: &str| on_url(&weak, url)));

            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let task_inner = Arc::clone(&inner);
                    let cancel = cancel.clone();
                    runtime.spawn(async move {
                        let inner = task_inner;
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                debug!("root unmounted before initial state resolved");
                            }
                            outcome = inner.resolver.resolve(inner.platform.as_ref(), &inner.options) => {
                                info!(?outcome, "initial navigation state resolved");
                            }
                        }
                    });
                }
                Err(_) => {
                    warn!("no tokio runtime, skipping launch link and using fallback state");
                    inner.resolver.abandon();
                }
            }
            Some(sub)
        } else {
            None
        };

        info!(linking = enabled, "navigation root mounted");

        Self {
            inner,
            fallback,
            back_sub,
            url_sub,
            state_sub,
            cancel,
            unmounted: AtomicBool::new(false),
        }
    }

    /// What to show right now.
    ///
    /// The first navigator render mounts the container with the resolved
    /// initial state.
    pub fn render(&self) -> Render<'_, V> {
        if !self.inner.resolver.is_ready() {
            return Render::Fallback(self.fallback.as_ref());
        }

        let initial_state = self.inner.resolver.initial_state();
        if !self.inner.navigator_mounted.swap(true, Ordering::AcqRel) {
            self.inner.container.mount(initial_state.clone());
        }

        Render::Navigator(NavigatorView {
            initial_state,
            theme: self.theme(),
            linking: self.linking(),
            handle: self.handle(),
        })
    }

    /// Wait until the initial state is resolved.
    pub async fn ready(&self) {
        self.inner.resolver.wait_ready().await;
    }

    pub fn is_ready(&self) -> bool {
        self.inner.resolver.is_ready()
    }

    pub fn phase(&self) -> ResolverPhase {
        self.inner.resolver.phase()
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.inner.resolver.resolution()
    }

    pub fn is_linking_enabled(&self) -> bool {
        self.inner.enabled
    }

    /// The `link_to` capability. Same `Arc` for the lifetime of the mount.
    pub fn linking(&self) -> LinkingContext {
        Arc::clone(&self.inner.linking)
    }

    pub fn handle(&self) -> NavigationHandle {
        NavigationHandle {
            container: Arc::clone(&self.inner.container),
        }
    }

    /// Replace the linking options. Later `link_to` calls and URL events
    /// use the new value. Whether linking is enabled is decided at mount
    /// and does not change.
    pub fn set_linking(&self, linking: LinkingOptions) {
        self.inner.options.store(linking);
    }

    pub fn theme(&self) -> Theme {
        self.inner
            .theme
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_theme(&self, theme: Theme) {
        *self.inner.theme.write().unwrap_or_else(PoisonError::into_inner) = theme;
    }

    /// Tear down subscriptions and stop a pending resolution. Idempotent.
    ///
    /// A pending resolution settles with the fallback state, so anyone
    /// waiting in [`ready`](Self::ready) is released.
    pub fn unmount(&self) {
        if self.unmounted.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel.cancel();
        self.inner.resolver.abandon();
        self.inner.back.unsubscribe(self.back_sub);
        if let Some(id) = self.url_sub {
            self.inner.platform.unsubscribe(id);
        }
        if let Some(id) = self.state_sub {
            self.inner.container.remove_listener(id);
        }
        info!("navigation root unmounted");
    }
}

impl<V> Drop for NavigationRoot<V> {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn on_url(inner: &Weak<RootInner>, url: &str) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    if !inner.navigator_mounted.load(Ordering::Acquire) {
        debug!(url, "dropping link event before navigator is mounted");
        return;
    }
    let outcome = inner.linking.link_to(url);
    debug!(url, ?outcome, "handled link event");
}
