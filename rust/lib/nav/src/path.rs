//! Path ↔ state translation.
//!
//! `path_to_state` is what the root and `link_to` call: it strips a
//! recognized prefix, then hands the in-app path either to the caller's
//! `get_state_from_path` override or to the default algorithm below.
//!
//! The default algorithm flattens the screen config into patterns, picks
//! the most specific one with a `RouteTrie`, and builds a nested partial
//! state along the matched chain. Path params go to the screen whose own
//! pattern declares them, by position, so a nested screen may reuse its
//! parent's param name. Query params go to the deepest route. What a `*`
//! segment swallows is kept on its screen as the `"*"` param.

use serde_json::Value;

use crate::config::{
    stringify_param, LinkingConfig, LinkingOptions, ScreenPattern, param_name,
    split_segments,
};
use crate::error::LinkingError;
use crate::state::{NavigationState, Params, Route};
use crate::trie::{RouteTrie, WILDCARD};

// ── QueryParams ──

/// Parsed, percent-decoded query string: `count=3&name=alice`.
#[derive(Debug, Clone, Default, PartialEq)]
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parse a query string (without the leading `?`).
    fn parse(query: &str) -> Self {
        Self(
            query
                .split('&')
                .filter(|s| !s.is_empty())
                .map(|pair| match pair.split_once('=') {
                    Some((k, v)) => (decode(k), decode(v)),
                    None => (decode(pair), String::new()),
                })
                .collect(),
        )
    }

    /// Params keyed by name. The first occurrence of a key wins.
    fn into_params(self) -> Params {
        let mut params = Params::new();
        for (k, v) in self.0 {
            params.entry(k).or_insert(Value::String(v));
        }
        params
    }
}

/// Split `path?query` into its two halves. A `#fragment` is dropped.
fn split_url(url: &str) -> (&str, &str) {
    let url = url.split_once('#').map_or(url, |(u, _)| u);
    url.split_once('?').unwrap_or((url, ""))
}

// ── Percent encoding ──

fn decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

// ── Prefixes ──

/// Strip the first matching prefix from `url`.
///
/// A URL with a scheme that matches no prefix belongs to someone else and
/// yields `None`; a plain in-app path is returned unchanged.
pub fn extract_path<'a>(url: &'a str, prefixes: &[String]) -> Option<&'a str> {
    for prefix in prefixes {
        if let Some(rest) = url.strip_prefix(prefix.as_str()) {
            let at_boundary = prefix.ends_with('/')
                || rest.is_empty()
                || rest.starts_with(['/', '?', '#']);
            if at_boundary {
                return Some(rest);
            }
        }
    }
    if has_scheme(url) { None } else { Some(url) }
}

fn has_scheme(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

// ── Path → state ──

/// Translate a URL or in-app path using the current options.
pub fn path_to_state(url: &str, options: &LinkingOptions) -> Option<NavigationState> {
    let path = extract_path(url, &options.prefixes)?;
    match &options.get_state_from_path {
        Some(custom) => custom(path, options.config.as_ref()),
        None => get_state_from_path(path, options.config.as_ref()),
    }
}

/// Default path → state algorithm.
///
/// Returns `None` when the config has no screen for the path. Without any
/// config, each segment becomes a nested route named after it.
pub fn get_state_from_path(path: &str, config: Option<&LinkingConfig>) -> Option<NavigationState> {
    let (path, query) = split_url(path);
    let query = QueryParams::parse(query);

    let Some(config) = config else {
        return segments_to_state(path, query);
    };

    let patterns = config.patterns();
    let mut trie = RouteTrie::new();
    for (i, entry) in patterns.iter().enumerate() {
        trie.insert(&owned_pattern(entry), i);
    }

    let matched = trie.best_match(path)?;
    let entry = &patterns[matched.value];
    let star_owner = entry.owners.last().copied().unwrap_or_default();
    let captured: Vec<Capture> = matched
        .params
        .into_iter()
        .filter_map(|(key, raw)| {
            if key == WILDCARD {
                let rest: Vec<String> = split_segments(&raw).map(decode).collect();
                return (!rest.is_empty()).then(|| Capture {
                    owner: star_owner,
                    name: key,
                    value: rest.join("/"),
                });
            }
            let (owner, name) = key.split_once('.')?;
            Some(Capture {
                owner: owner.parse().ok()?,
                name: name.to_string(),
                value: decode(&raw),
            })
        })
        .collect();

    Some(build_state(entry, &captured, query))
}

/// A path param tagged with the chain index of the screen that declared it.
struct Capture {
    owner: usize,
    name: String,
    value: String,
}

/// Trie pattern with every param renamed to `{owner}.{name}`.
fn owned_pattern(entry: &ScreenPattern) -> String {
    entry
        .segments()
        .map(|(seg, owner)| match seg.strip_prefix(':') {
            Some(param) => format!(":{owner}.{param}"),
            None => seg.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn build_state(entry: &ScreenPattern, captured: &[Capture], query: QueryParams) -> NavigationState {
    let last = entry.chain.len() - 1;
    let mut child: Option<NavigationState> = None;

    for (depth, link) in entry.chain.iter().enumerate().rev() {
        let mut params = if depth == last {
            let mut q = query.clone().into_params();
            for (k, v) in q.iter_mut() {
                let raw = v.as_str().map(str::to_owned);
                if let (Some(kind), Some(raw)) = (link.parse.get(k), raw) {
                    *v = kind.parse(&raw);
                }
            }
            q
        } else {
            Params::new()
        };

        for capture in captured.iter().filter(|c| c.owner == depth) {
            let value = match link.parse.get(&capture.name) {
                Some(kind) if capture.name != WILDCARD => kind.parse(&capture.value),
                _ => Value::String(capture.value.clone()),
            };
            params.insert(capture.name.clone(), value);
        }

        let mut route = Route::new(link.name.clone()).with_params(params);
        if let Some(state) = child.take() {
            route = route.with_state(state);
        }

        let level = match &link.navigator_initial {
            Some(initial) if *initial != link.name => {
                NavigationState::new(vec![Route::new(initial.clone()), route]).with_index(1)
            }
            _ => NavigationState::new(vec![route]),
        };
        child = Some(level);
    }

    child.unwrap_or_default()
}

fn segments_to_state(path: &str, query: QueryParams) -> Option<NavigationState> {
    let names: Vec<String> = split_segments(path).map(decode).collect();
    let (leaf, parents) = names.split_last()?;

    let mut state =
        NavigationState::new(vec![Route::new(leaf.clone()).with_params(query.into_params())]);
    for name in parents.iter().rev() {
        state = NavigationState::new(vec![Route::new(name.clone()).with_state(state)]);
    }
    Some(state)
}

// ── State → path ──

/// Translate a state back into an in-app path using the current options.
pub fn state_to_path(state: &NavigationState, options: &LinkingOptions) -> Result<String, LinkingError> {
    match &options.get_path_from_state {
        Some(custom) => Ok(custom(state, options.config.as_ref())),
        None => get_path_from_state(state, options.config.as_ref()),
    }
}

/// Default state → path algorithm, the inverse of [`get_state_from_path`].
///
/// Follows the focused chain. Params not consumed by the pattern become a
/// query string sorted by key. The result always starts with `/`.
pub fn get_path_from_state(
    state: &NavigationState,
    config: Option<&LinkingConfig>,
) -> Result<String, LinkingError> {
    let chain = state.focused_chain();
    let Some(leaf) = chain.last() else {
        return Ok("/".to_string());
    };
    let names: Vec<&str> = chain.iter().map(|r| r.name.as_str()).collect();

    let entry = config.and_then(|c| {
        c.patterns()
            .into_iter()
            .find(|e| e.route_names() == names)
    });

    let last = chain.len() - 1;
    let mut segments = Vec::new();
    let mut used = Vec::new();

    match &entry {
        Some(entry) => {
            for (seg, owner) in entry.segments() {
                let route = chain[owner];
                if seg == "*" {
                    if let Some(rest) = route.param(WILDCARD) {
                        segments.extend(split_segments(&stringify_param(rest)).map(encode));
                        if owner == last {
                            used.push(WILDCARD.to_string());
                        }
                    }
                    continue;
                }
                let Some(name) = param_name(seg) else {
                    segments.push(seg.to_string());
                    continue;
                };
                match route.param(name) {
                    Some(v) => {
                        segments.push(encode(&stringify_param(v)));
                        if owner == last {
                            used.push(name.to_string());
                        }
                    }
                    None if seg.ends_with('?') => {}
                    None => {
                        return Err(LinkingError::MissingParam {
                            screen: route.name.clone(),
                            param: name.to_string(),
                        });
                    }
                }
            }
        }
        None => segments.extend(names.iter().map(|n| encode(n))),
    }

    let mut query: Vec<(String, String)> = leaf
        .params
        .iter()
        .flatten()
        .filter(|(k, _)| !used.iter().any(|u| u == *k))
        .map(|(k, v)| (encode(k), encode(&stringify_param(v))))
        .collect();
    query.sort();

    let mut path = format!("/{}", segments.join("/"));
    if !query.is_empty() {
        let query: Vec<String> = query.into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        path.push('?');
        path.push_str(&query.join("&"));
    }
    Ok(path)
}
