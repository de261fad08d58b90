//! Stack reducer used by the default `NavigationStore`.
//!
//! Each navigator level behaves like a stack: navigating to a route that
//! is already present focuses it and drops everything above it, otherwise
//! the route is pushed. A level with `route_names` rejects screens it does
//! not list.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::action::{NavigateTarget, NavigationAction};
use crate::state::{NavigationState, Route};

/// Generates `{name}-{n}` route keys.
#[derive(Debug, Default)]
pub struct KeyGen(AtomicU64);

impl KeyGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, name: &str) -> String {
        format!("{name}-{}", self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// Fill in missing route keys throughout the tree.
pub fn assign_keys(mut state: NavigationState, keys: &KeyGen) -> NavigationState {
    for route in &mut state.routes {
        if route.key.is_none() {
            route.key = Some(keys.next(&route.name));
        }
        if let Some(child) = route.state.take() {
            route.state = Some(Box::new(assign_keys(*child, keys)));
        }
    }
    state
}

/// Apply an action. `None` means the action was not handled.
pub fn reduce(
    state: Option<&NavigationState>,
    action: &NavigationAction,
    keys: &KeyGen,
) -> Option<NavigationState> {
    match action {
        NavigationAction::Reset(next) => Some(assign_keys(next.clone(), keys)),
        NavigationAction::Navigate(target) => {
            let empty = NavigationState::default();
            navigate(state.unwrap_or(&empty), target, keys)
        }
        NavigationAction::GoBack => state.and_then(go_back),
    }
}

fn navigate(state: &NavigationState, target: &NavigateTarget, keys: &KeyGen) -> Option<NavigationState> {
    if !state.route_names.is_empty() && !state.route_names.iter().any(|n| *n == target.name) {
        return None;
    }

    let mut next = state.clone();
    match next.routes.iter().rposition(|r| r.name == target.name) {
        Some(i) => {
            next.routes.truncate(i + 1);
            let route = &mut next.routes[i];
            if let Some(params) = &target.params {
                let merged = route.params.get_or_insert_with(Default::default);
                merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            if let Some(hop) = &target.screen {
                let child = route.state.as_deref().cloned().unwrap_or_default();
                route.state = Some(Box::new(navigate(&child, hop, keys)?));
            } else if let Some(nested) = &target.state {
                route.state = Some(Box::new(assign_keys(nested.clone(), keys)));
            }
        }
        None => next.routes.push(route_from_target(target, keys)),
    }
    next.index = Some(next.routes.len() - 1);
    Some(next)
}

fn route_from_target(target: &NavigateTarget, keys: &KeyGen) -> Route {
    let mut route = Route::new(target.name.clone());
    route.key = Some(keys.next(&target.name));
    route.params = target.params.clone();
    if let Some(hop) = &target.screen {
        route.state = Some(Box::new(NavigationState::new(vec![route_from_target(hop, keys)])));
    } else if let Some(nested) = &target.state {
        route.state = Some(Box::new(assign_keys(nested.clone(), keys)));
    }
    route
}

/// Pop the focused route of the deepest navigator that has more than one.
pub fn go_back(state: &NavigationState) -> Option<NavigationState> {
    let focused = state.focused_index()?;
    let route = &state.routes[focused];

    if let Some(child) = route.state.as_deref().and_then(go_back) {
        let mut next = state.clone();
        next.routes[focused].state = Some(Box::new(child));
        return Some(next);
    }

    if state.routes.len() < 2 {
        return None;
    }
    let mut next = state.clone();
    next.routes.remove(focused);
    next.index = Some(focused.saturating_sub(1).min(next.routes.len() - 1));
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target(name: &str) -> NavigateTarget {
        NavigateTarget::new(name)
    }

    fn stack(names: &[&str]) -> NavigationState {
        assign_keys(
            NavigationState::new(names.iter().map(|n| Route::new(*n)).collect()),
            &KeyGen::new(),
        )
    }

    // ========================================================================
    // Keys
    // ========================================================================

    #[test]
    fn keys_are_unique_and_named() {
        let keys = KeyGen::new();
        assert_eq!(keys.next("Home"), "Home-0");
        assert_eq!(keys.next("Home"), "Home-1");
    }

    #[test]
    fn assign_keys_fills_nested_and_keeps_existing() {
        let mut home = Route::new("Home").with_state(NavigationState::new(vec![Route::new("Feed")]));
        home.key = Some("fixed".into());
        let state = assign_keys(NavigationState::new(vec![home]), &KeyGen::new());
        assert_eq!(state.routes[0].key.as_deref(), Some("fixed"));
        let inner = state.routes[0].state.as_deref().unwrap();
        assert_eq!(inner.routes[0].key.as_deref(), Some("Feed-0"));
    }

    // ========================================================================
    // Navigate
    // ========================================================================

    #[test]
    fn navigate_pushes_new_route() {
        let keys = KeyGen::new();
        let next = reduce(Some(&stack(&["Home"])), &NavigationAction::Navigate(target("Profile")), &keys).unwrap();
        assert_eq!(next.active_route_path(), vec!["Profile"]);
        assert_eq!(next.routes.len(), 2);
        assert_eq!(next.index, Some(1));
    }

    #[test]
    fn navigate_to_existing_focuses_and_pops_above() {
        let keys = KeyGen::new();
        let next = reduce(
            Some(&stack(&["Home", "Profile", "Settings"])),
            &NavigationAction::Navigate(target("Profile")),
            &keys,
        )
        .unwrap();
        assert_eq!(next.routes.len(), 2);
        assert_eq!(next.active_route_path(), vec!["Profile"]);
    }

    #[test]
    fn navigate_merges_params() {
        let keys = KeyGen::new();
        let mut start = stack(&["Profile"]);
        start.routes[0].params = Some(json!({"id": "1", "tab": "a"}).as_object().cloned().unwrap());
        let mut t = target("Profile");
        t.params = Some(json!({"id": "2"}).as_object().cloned().unwrap());

        let next = reduce(Some(&start), &NavigationAction::Navigate(t), &keys).unwrap();
        assert_eq!(next.routes[0].param("id"), Some(&json!("2")));
        assert_eq!(next.routes[0].param("tab"), Some(&json!("a")));
    }

    #[test]
    fn navigate_rejects_unknown_route_name() {
        let keys = KeyGen::new();
        let start = stack(&["Home"]).with_route_names(["Home"]);
        assert!(reduce(Some(&start), &NavigationAction::Navigate(target("Nope")), &keys).is_none());
    }

    #[test]
    fn navigate_descends_into_nested_screen() {
        let keys = KeyGen::new();
        let start = assign_keys(
            NavigationState::new(vec![Route::new("Home").with_state(NavigationState::new(vec![Route::new("Feed")]))]),
            &keys,
        );
        let mut t = target("Home");
        t.screen = Some(Box::new(target("Post")));

        let next = reduce(Some(&start), &NavigationAction::Navigate(t), &keys).unwrap();
        assert_eq!(next.active_route_path(), vec!["Home", "Post"]);
        let inner = next.routes[0].state.as_deref().unwrap();
        assert_eq!(inner.routes.len(), 2);
    }

    #[test]
    fn navigate_from_empty_builds_tree() {
        let keys = KeyGen::new();
        let mut t = target("Home");
        t.screen = Some(Box::new(target("Post")));
        let next = reduce(None, &NavigationAction::Navigate(t), &keys).unwrap();
        assert_eq!(next.active_route_path(), vec!["Home", "Post"]);
        assert!(next.routes[0].key.is_some());
    }

    // ========================================================================
    // Reset / GoBack
    // ========================================================================

    #[test]
    fn reset_replaces_state_with_keys() {
        let keys = KeyGen::new();
        let next = reduce(
            Some(&stack(&["A", "B"])),
            &NavigationAction::Reset(NavigationState::new(vec![Route::new("C")])),
            &keys,
        )
        .unwrap();
        assert_eq!(next.active_route_path(), vec!["C"]);
        assert!(next.routes[0].key.is_some());
    }

    #[test]
    fn go_back_pops_focused_route() {
        let next = go_back(&stack(&["A", "B"])).unwrap();
        assert_eq!(next.routes.len(), 1);
        assert_eq!(next.active_route_path(), vec!["A"]);
        assert!(go_back(&next).is_none());
    }

    #[test]
    fn go_back_prefers_deepest_navigator() {
        let inner = NavigationState::new(vec![Route::new("Feed"), Route::new("Post")]);
        let state = NavigationState::new(vec![Route::new("Login"), Route::new("Home").with_state(inner)]);
        let next = go_back(&state).unwrap();
        assert_eq!(next.routes.len(), 2);
        assert_eq!(next.active_route_path(), vec!["Home", "Feed"]);
    }

    #[test]
    fn go_back_on_empty_is_unhandled() {
        assert!(reduce(None, &NavigationAction::GoBack, &KeyGen::new()).is_none());
    }
}
