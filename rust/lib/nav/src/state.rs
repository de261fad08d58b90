//! Declarative navigation state: "where we want to be".
//!
//! A `NavigationState` is an immutable tree: each navigator level holds a
//! list of routes and the index of the focused one, and a route may carry
//! the state of a nested navigator. The tree serializes with the same
//! camelCase field names the platform bindings use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Route params. Path and query params arrive as strings; `parse` rules in
/// the linking config may turn them into numbers or booleans.
pub type Params = serde_json::Map<String, Value>;

/// One navigator level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// Focused route. `None` means the last route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub routes: Vec<Route>,
    /// Screens this navigator can show. Empty for partial states produced
    /// from a path; filled in by the container for live states.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_names: Vec<String>,
}

/// A single entry in a navigator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Assigned by the container when the route enters a live state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Box<NavigationState>>,
}

impl NavigationState {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            index: None,
            routes,
            route_names: Vec::new(),
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_route_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Index of the focused route, clamped to the route list.
    pub fn focused_index(&self) -> Option<usize> {
        if self.routes.is_empty() {
            return None;
        }
        let last = self.routes.len() - 1;
        Some(self.index.map_or(last, |i| i.min(last)))
    }

    pub fn focused_route(&self) -> Option<&Route> {
        self.focused_index().map(|i| &self.routes[i])
    }

    /// Focused routes from this level down to the deepest nested navigator.
    pub fn focused_chain(&self) -> Vec<&Route> {
        let mut chain = Vec::new();
        let mut level = Some(self);
        while let Some(state) = level {
            match state.focused_route() {
                Some(route) => {
                    chain.push(route);
                    level = route.state.as_deref();
                }
                None => break,
            }
        }
        chain
    }

    /// Names along the focused chain, e.g. `["Home", "Feed", "Post"]`.
    pub fn active_route_path(&self) -> Vec<String> {
        self.focused_chain()
            .into_iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Whether this navigator can show a screen with the given name.
    pub fn knows_route(&self, name: &str) -> bool {
        self.route_names.iter().any(|n| n == name) || self.routes.iter().any(|r| r.name == name)
    }
}

impl Route {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            key: None,
            name: name.into(),
            params: None,
            state: None,
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = if params.is_empty() { None } else { Some(params) };
        self
    }

    pub fn with_state(mut self, state: NavigationState) -> Self {
        self.state = Some(Box::new(state));
        self
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|p| p.get(name))
    }
}
