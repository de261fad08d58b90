//! Nav: deep-link aware navigation root.
//!
//! Sits at the top of an app's navigation tree and turns URLs into
//! navigation state. Rendering is left to the host; this crate decides
//! *what* state the tree starts in and *how* a link moves it.
//!
//! # Pieces
//!
//! - [`path`]: URL ↔ state translation driven by a [`LinkingConfig`]
//! - [`resolver`]: launch-URL race, link or fallback, never later
//!   than the configured timeout (150 ms by default)
//! - [`linking`]: `link_to(path)`, always reading the latest options
//! - [`container`]: [`NavigationRoot`] with readiness gating, back button,
//!   theme and the imperative [`NavigationHandle`]
//!
//! # Path Patterns
//!
//! Screens map to `/`-separated patterns:
//! - Literal: `settings/profile`
//! - Param: `user/:id`
//! - Optional param: `post/:id?`
//! - Catch-all: `*`
//!
//! # Example
//!
//! ```ignore
//! use openerp_nav::{LinkingOptions, NavigationRoot, NavigationStore, RootOptions};
//!
//! let linking = LinkingOptions::from_json_str(r#"{
//!     "prefixes": ["myapp://"],
//!     "config": { "screens": { "Home": "", "Profile": "user/:id" } }
//! }"#)?;
//!
//! let root = NavigationRoot::mount(
//!     RootOptions::<()>::new().with_linking(linking),
//!     Arc::new(NavigationStore::new()),
//!     platform,
//!     back,
//! );
//! root.ready().await;
//! root.render();
//! root.linking().link_to("/user/42");
//! ```

pub mod action;
pub mod config;
pub mod container;
pub mod error;
pub mod linking;
pub mod path;
pub mod platform;
pub mod reducer;
pub mod resolver;
pub mod state;
pub mod store;
pub mod theme;
pub mod trie;

// Re-export primary types at crate root.
pub use action::{NavigateTarget, NavigationAction};
pub use config::{LinkingConfig, LinkingOptions, ResolverConfig, ScreenConfig};
pub use container::{NavigationHandle, NavigationRoot, NavigatorView, Render, RootOptions};
pub use error::LinkingError;
pub use linking::{LinkDispatcher, LinkOutcome, LinkingContext};
pub use path::{get_path_from_state, get_state_from_path};
pub use platform::{BackHandler, BoxFuture, LinkingPlatform, MemoryBackHandler, MemoryPlatform};
pub use resolver::{InitialStateResolver, Resolution, ResolverPhase};
pub use state::{NavigationState, Params, Route};
pub use store::{NavigationContainer, NavigationStore, StateListener, SubscriptionId};
pub use theme::Theme;
