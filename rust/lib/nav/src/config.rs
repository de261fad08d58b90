//! Linking and resolver configuration.
//!
//! `LinkingOptions` is the caller-facing surface: recognized prefixes, the
//! screen mapping used by the default translator, and optional function
//! overrides. The data part deserializes from JSON; overrides are attached
//! with the `with_*` builders.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::NavigationAction;
use crate::error::LinkingError;
use crate::state::NavigationState;

/// Custom path → state converter. Receives the raw config.
pub type GetStateFromPath =
    Arc<dyn Fn(&str, Option<&LinkingConfig>) -> Option<NavigationState> + Send + Sync>;

/// Custom state → action converter.
pub type GetActionFromState =
    Arc<dyn Fn(&NavigationState, Option<&LinkingConfig>) -> Option<NavigationAction> + Send + Sync>;

/// Custom state → path converter.
pub type GetPathFromState =
    Arc<dyn Fn(&NavigationState, Option<&LinkingConfig>) -> String + Send + Sync>;

/// Launch-URL wait used when nothing else is configured.
pub const DEFAULT_INITIAL_URL_TIMEOUT: Duration = Duration::from_millis(150);

// ── Screen mapping ──

/// Screen mapping for the default translator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkingConfig {
    /// Screen inserted below the matched one in the root navigator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_route_name: Option<String>,
    #[serde(default)]
    pub screens: BTreeMap<String, ScreenConfig>,
}

/// Either a bare pattern (`"user/:id"`) or a nested navigator description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenConfig {
    Path(String),
    Nested(NestedScreen),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedScreen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Do not prepend the parent pattern.
    #[serde(default)]
    pub exact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_route_name: Option<String>,
    #[serde(default)]
    pub screens: BTreeMap<String, ScreenConfig>,
    #[serde(default)]
    pub parse: BTreeMap<String, ParamType>,
}

/// Conversion applied to a raw string param.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
}

impl ParamType {
    /// Convert a raw value. Values that do not parse stay strings.
    pub fn parse(self, raw: &str) -> Value {
        match self {
            ParamType::String => Value::String(raw.to_string()),
            ParamType::Number => {
                if let Ok(n) = raw.parse::<i64>() {
                    Value::from(n)
                } else {
                    raw.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or_else(|| Value::String(raw.to_string()))
                }
            }
            ParamType::Boolean => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(raw.to_string()),
            },
        }
    }
}

/// Render a param value back into its path form.
pub fn stringify_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl ScreenConfig {
    fn path(&self) -> Option<&str> {
        match self {
            ScreenConfig::Path(p) => Some(p.as_str()),
            ScreenConfig::Nested(n) => n.path.as_deref(),
        }
    }
}

// ── Flattened patterns ──

/// One linkable screen with its full pattern and the route chain leading
/// to it from the root navigator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPattern {
    /// Normalized full pattern, no leading or trailing `/`.
    pub pattern: String,
    /// For each segment of `pattern`, the index in `chain` of the screen
    /// whose own path contributed it.
    pub owners: Vec<usize>,
    pub chain: Vec<ChainLink>,
}

/// A route along a `ScreenPattern` chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub name: String,
    /// `initial_route_name` of the navigator that contains this route.
    pub navigator_initial: Option<String>,
    pub parse: BTreeMap<String, ParamType>,
}

impl ScreenPattern {
    pub fn leaf(&self) -> &str {
        self.chain.last().map(|l| l.name.as_str()).unwrap_or("")
    }

    pub fn route_names(&self) -> Vec<&str> {
        self.chain.iter().map(|l| l.name.as_str()).collect()
    }

    /// Pattern segments paired with their owning chain index.
    pub fn segments(&self) -> impl Iterator<Item = (&str, usize)> {
        split_segments(&self.pattern).zip(self.owners.iter().copied())
    }
}

impl LinkingConfig {
    pub fn from_json_str(json: &str) -> Result<Self, LinkingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flatten the screen tree into linkable patterns, parents before children.
    ///
    /// When a descendant ends up with the same full pattern as an ancestor,
    /// only the descendant is kept.
    pub fn patterns(&self) -> Vec<ScreenPattern> {
        let mut out = Vec::new();
        collect(
            &self.screens,
            "",
            &[],
            &[],
            self.initial_route_name.as_deref(),
            &mut out,
        );
        let mut kept: Vec<ScreenPattern> = Vec::with_capacity(out.len());
        for entry in out {
            kept.retain(|prev| {
                !(prev.pattern == entry.pattern
                    && entry.chain.len() > prev.chain.len()
                    && entry.chain[..prev.chain.len()] == prev.chain[..])
            });
            kept.push(entry);
        }
        kept
    }

    /// Check patterns for malformed segments and collisions.
    pub fn validate(&self) -> Result<(), LinkingError> {
        let patterns = self.patterns();
        for entry in &patterns {
            let segments: Vec<&str> = split_segments(&entry.pattern).collect();
            for (i, seg) in segments.iter().enumerate() {
                if *seg == "*" && i + 1 != segments.len() {
                    return Err(LinkingError::InvalidPattern {
                        pattern: entry.pattern.clone(),
                        reason: "`*` must be the last segment".into(),
                    });
                }
                if let Some(name) = seg.strip_prefix(':') {
                    if name.trim_end_matches('?').is_empty() {
                        return Err(LinkingError::InvalidPattern {
                            pattern: entry.pattern.clone(),
                            reason: "empty param name".into(),
                        });
                    }
                }
            }
        }
        for (i, a) in patterns.iter().enumerate() {
            if let Some(b) = patterns[i + 1..].iter().find(|b| b.pattern == a.pattern) {
                return Err(LinkingError::DuplicatePattern {
                    pattern: a.pattern.clone(),
                    first: a.route_names().join("/"),
                    second: b.route_names().join("/"),
                });
            }
        }
        Ok(())
    }
}

fn collect(
    screens: &BTreeMap<String, ScreenConfig>,
    parent_pattern: &str,
    parent_owners: &[usize],
    parent_chain: &[ChainLink],
    navigator_initial: Option<&str>,
    out: &mut Vec<ScreenPattern>,
) {
    for (name, screen) in screens {
        let own = screen.path().map(normalize_pattern);
        let (exact, parse, nested_initial, children) = match screen {
            ScreenConfig::Path(_) => (false, BTreeMap::new(), None, None),
            ScreenConfig::Nested(n) => (
                n.exact,
                n.parse.clone(),
                n.initial_route_name.as_deref(),
                Some(&n.screens),
            ),
        };

        let depth = parent_chain.len();
        let own_owners = |own: &str| vec![depth; split_segments(own).count()];
        let (pattern, owners) = match own.as_deref() {
            Some(own) if exact => (own.to_string(), own_owners(own)),
            Some(own) => (
                join_pattern(parent_pattern, own),
                [parent_owners, own_owners(own).as_slice()].concat(),
            ),
            None => (parent_pattern.to_string(), parent_owners.to_vec()),
        };

        let mut chain = parent_chain.to_vec();
        chain.push(ChainLink {
            name: name.clone(),
            navigator_initial: navigator_initial.map(String::from),
            parse,
        });

        if own.is_some() {
            out.push(ScreenPattern {
                pattern: pattern.clone(),
                owners: owners.clone(),
                chain: chain.clone(),
            });
        }
        if let Some(children) = children {
            collect(children, &pattern, &owners, &chain, nested_initial, out);
        }
    }
}

/// Strip surrounding slashes and collapse empty segments.
pub fn normalize_pattern(pattern: &str) -> String {
    split_segments(pattern).collect::<Vec<_>>().join("/")
}

pub(crate) fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// `:id` → `id`, `:id?` → `id`, anything else → `None`.
pub(crate) fn param_name(segment: &str) -> Option<&str> {
    segment.strip_prefix(':').map(|n| n.trim_end_matches('?'))
}

fn join_pattern(parent: &str, own: &str) -> String {
    match (parent.is_empty(), own.is_empty()) {
        (true, _) => own.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{parent}/{own}"),
    }
}

// ── LinkingOptions ──

/// Deep-link handling options for the navigation root.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkingOptions {
    /// `false` turns off launch-URL resolution and URL events entirely.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Recognized URL prefixes, e.g. `myapp://` or `https://example.com`.
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub config: Option<LinkingConfig>,
    #[serde(skip)]
    pub get_state_from_path: Option<GetStateFromPath>,
    #[serde(skip)]
    pub get_action_from_state: Option<GetActionFromState>,
    #[serde(skip)]
    pub get_path_from_state: Option<GetPathFromState>,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for LinkingOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            prefixes: Vec::new(),
            config: None,
            get_state_from_path: None,
            get_action_from_state: None,
            get_path_from_state: None,
        }
    }
}

impl fmt::Debug for LinkingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkingOptions")
            .field("enabled", &self.enabled)
            .field("prefixes", &self.prefixes)
            .field("config", &self.config)
            .field("get_state_from_path", &self.get_state_from_path.is_some())
            .field("get_action_from_state", &self.get_action_from_state.is_some())
            .field("get_path_from_state", &self.get_path_from_state.is_some())
            .finish()
    }
}

impl LinkingOptions {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LinkingError> {
        let options: Self = serde_json::from_str(json)?;
        if let Some(config) = &options.config {
            config.validate()?;
        }
        Ok(options)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, LinkingError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn with_config(mut self, config: LinkingConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_state_from_path<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Option<&LinkingConfig>) -> Option<NavigationState> + Send + Sync + 'static,
    {
        self.get_state_from_path = Some(Arc::new(f));
        self
    }

    pub fn with_action_from_state<F>(mut self, f: F) -> Self
    where
        F: Fn(&NavigationState, Option<&LinkingConfig>) -> Option<NavigationAction>
            + Send
            + Sync
            + 'static,
    {
        self.get_action_from_state = Some(Arc::new(f));
        self
    }

    pub fn with_path_from_state<F>(mut self, f: F) -> Self
    where
        F: Fn(&NavigationState, Option<&LinkingConfig>) -> String + Send + Sync + 'static,
    {
        self.get_path_from_state = Some(Arc::new(f));
        self
    }
}

// ── ResolverConfig ──

/// Timing for initial-state resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// How long to wait for the launch URL before rendering without it.
    pub initial_url_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            initial_url_timeout: DEFAULT_INITIAL_URL_TIMEOUT,
        }
    }
}

impl ResolverConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            initial_url_timeout: timeout,
        }
    }
}
