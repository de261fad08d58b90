//! Imperative navigation actions: "the command that gets us there".

use serde::{Deserialize, Serialize};

use crate::config::{LinkingConfig, LinkingOptions};
use crate::state::{NavigationState, Params, Route};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavigationAction {
    /// Focus (or push) a route in the root navigator, then descend.
    Navigate(NavigateTarget),
    /// Replace the whole tree.
    Reset(NavigationState),
    GoBack,
}

/// Destination of a `Navigate` action, one navigator level per hop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateTarget {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    /// Next hop inside this route's navigator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<Box<NavigateTarget>>,
    /// Full nested state, used when the nested level has more than one
    /// route (e.g. an inserted initial route) and a single hop can't say it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<NavigationState>,
}

impl NavigateTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: None,
            screen: None,
            state: None,
        }
    }

    fn from_route(route: &Route) -> Self {
        let mut target = Self::new(route.name.clone());
        target.params = route.params.clone();
        if let Some(child) = route.state.as_deref() {
            match child.routes.as_slice() {
                [only] => target.screen = Some(Box::new(Self::from_route(only))),
                _ => target.state = Some(child.clone()),
            }
        }
        target
    }
}

/// Default state → action algorithm.
///
/// A partial state whose root holds exactly one route becomes a nested
/// `Navigate`. Anything else has no incremental form and returns `None`.
pub fn get_action_from_state(
    state: &NavigationState,
    _config: Option<&LinkingConfig>,
) -> Option<NavigationAction> {
    match state.routes.as_slice() {
        [root] => Some(NavigationAction::Navigate(NavigateTarget::from_route(root))),
        _ => None,
    }
}

/// Compute the action that moves `current` to `target`.
///
/// `None` tells the caller to reset the root instead. Besides the cases
/// [`get_action_from_state`] rejects, that happens when the live root
/// navigator does not know the target's root route. A custom
/// `get_action_from_state` override replaces this logic entirely.
pub fn state_to_action(
    target: &NavigationState,
    current: Option<&NavigationState>,
    options: &LinkingOptions,
) -> Option<NavigationAction> {
    if let Some(custom) = &options.get_action_from_state {
        return custom(target, options.config.as_ref());
    }

    let action = get_action_from_state(target, options.config.as_ref())?;
    if let (NavigationAction::Navigate(nav), Some(current)) = (&action, current) {
        if !current.knows_route(&nav.name) {
            return None;
        }
    }
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn params(v: Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    fn profile() -> NavigationState {
        NavigationState::new(vec![Route::new("Profile").with_params(params(json!({"id": "42"})))])
    }

    #[test]
    fn single_root_route_becomes_navigate() {
        let action = get_action_from_state(&profile(), None).unwrap();
        let mut expected = NavigateTarget::new("Profile");
        expected.params = Some(params(json!({"id": "42"})));
        assert_eq!(action, NavigationAction::Navigate(expected));
    }

    #[test]
    fn nested_single_routes_become_screen_hops() {
        let state = NavigationState::new(vec![Route::new("Home").with_state(
            NavigationState::new(vec![Route::new("Post").with_params(params(json!({"id": 7})))]),
        )]);
        let Some(NavigationAction::Navigate(target)) = get_action_from_state(&state, None) else {
            panic!("expected navigate");
        };
        assert_eq!(target.name, "Home");
        let hop = target.screen.unwrap();
        assert_eq!(hop.name, "Post");
        assert_eq!(hop.params, Some(params(json!({"id": 7}))));
        assert!(target.state.is_none());
    }

    #[test]
    fn nested_multi_route_level_is_carried_as_state() {
        let inner = NavigationState::new(vec![Route::new("Feed"), Route::new("Post")]).with_index(1);
        let state = NavigationState::new(vec![Route::new("Home").with_state(inner.clone())]);
        let Some(NavigationAction::Navigate(target)) = get_action_from_state(&state, None) else {
            panic!("expected navigate");
        };
        assert!(target.screen.is_none());
        assert_eq!(target.state, Some(inner));
    }

    #[test]
    fn multi_route_root_has_no_action() {
        let state = NavigationState::new(vec![Route::new("Home"), Route::new("Profile")]).with_index(1);
        assert!(get_action_from_state(&state, None).is_none());
        assert!(get_action_from_state(&NavigationState::default(), None).is_none());
    }

    #[test]
    fn unknown_root_route_needs_reset() {
        let current = NavigationState::new(vec![Route::new("Home")]).with_route_names(["Home", "Settings"]);
        let opts = LinkingOptions::default();
        assert!(state_to_action(&profile(), Some(&current), &opts).is_none());
    }

    #[test]
    fn known_root_route_navigates() {
        let current = NavigationState::new(vec![Route::new("Home")]).with_route_names(["Home", "Profile"]);
        let opts = LinkingOptions::default();
        assert!(matches!(
            state_to_action(&profile(), Some(&current), &opts),
            Some(NavigationAction::Navigate(_))
        ));
        // No live state yet: nothing to diff against.
        assert!(state_to_action(&profile(), None, &opts).is_some());
    }

    #[test]
    fn custom_action_from_state_overrides() {
        let opts = LinkingOptions::default().with_action_from_state(|state, _| {
            Some(NavigationAction::Reset(state.clone()))
        });
        let current = NavigationState::new(vec![Route::new("Home")]);
        assert_eq!(
            state_to_action(&profile(), Some(&current), &opts),
            Some(NavigationAction::Reset(profile()))
        );
    }

    #[test]
    fn actions_serialize_with_type_tag() {
        let v = serde_json::to_value(NavigationAction::GoBack).unwrap();
        assert_eq!(v, json!({"type": "GO_BACK"}));
        let v = serde_json::to_value(get_action_from_state(&profile(), None).unwrap()).unwrap();
        assert_eq!(
            v,
            json!({"type": "NAVIGATE", "name": "Profile", "params": {"id": "42"}})
        );
    }
}
