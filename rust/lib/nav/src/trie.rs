use std::collections::HashMap;

/// A Trie over route patterns for deep-link path matching.
///
/// Pattern segments:
/// - `user` matches the literal segment
/// - `:id` matches exactly one segment and captures it as `id`
/// - `:id?` optional; the pattern is stored both with and without it
/// - `*` matches any number of remaining segments (must be last) and
///   captures them, `/`-joined, as `*`
///
/// Patterns and paths use `/` as the level separator; empty segments are
/// ignored, so `"/user//42/"` is the same path as `"user/42"`.
///
/// # Examples
///
/// ```ignore
/// let mut trie = RouteTrie::new();
/// trie.insert("user/:id", "Profile");
/// trie.insert("user/me", "Me");
/// trie.insert("*", "NotFound");
///
/// // Literal beats param beats wildcard.
/// assert_eq!(trie.best_match("user/me").unwrap().value, "Me");
/// assert_eq!(trie.best_match("user/42").unwrap().value, "Profile");
/// assert_eq!(trie.best_match("x/y").unwrap().value, "NotFound");
/// ```
pub struct RouteTrie<T> {
    root: TrieNode<T>,
    next_seq: usize,
}

struct TrieNode<T> {
    /// Literal children, keyed by segment string.
    children: HashMap<String, TrieNode<T>>,
    /// `:param` child, matches exactly one segment.
    param: Option<Box<TrieNode<T>>>,
    /// Entries whose pattern ends with `*` at this level.
    rest: Vec<Entry<T>>,
    /// Entries whose pattern terminates here.
    values: Vec<Entry<T>>,
}

#[derive(Clone)]
struct Entry<T> {
    value: T,
    /// Param names in the order their segments appear.
    params: Vec<String>,
    seq: usize,
}

/// Param name under which a `*` match records the segments it swallowed.
pub const WILDCARD: &str = "*";

/// A successful match of a concrete path.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<T> {
    pub value: T,
    /// Captured `(name, raw segment)` pairs in path order. A `*` match
    /// ends with `(WILDCARD, rest)`.
    pub params: Vec<(String, String)>,
    literal: usize,
    dynamic: usize,
    wildcard: bool,
    seq: usize,
}

impl<T> RouteMatch<T> {
    /// Ordering key: lower sorts first and wins.
    fn rank(&self) -> (bool, std::cmp::Reverse<usize>, std::cmp::Reverse<usize>, usize) {
        (
            self.wildcard,
            std::cmp::Reverse(self.literal),
            std::cmp::Reverse(self.dynamic),
            self.seq,
        )
    }
}

impl<T> Default for TrieNode<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            param: None,
            rest: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Clone> RouteTrie<T> {
    /// Create a new empty Trie.
    pub fn new() -> Self {
        Self {
            root: TrieNode::default(),
            next_seq: 0,
        }
    }

    /// Insert a value at the given pattern.
    ///
    /// Earlier inserts win ties between equally specific patterns.
    pub fn insert(&mut self, pattern: &str, value: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        for variant in expand_optional(pattern) {
            let params = variant
                .iter()
                .filter_map(|s| s.strip_prefix(':'))
                .map(String::from)
                .collect();
            let entry = Entry {
                value: value.clone(),
                params,
                seq,
            };
            self.root.insert(&variant, entry);
        }
    }

    /// Return every pattern that matches the path, best first.
    pub fn match_path(&self, path: &str) -> Vec<RouteMatch<T>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut results = Vec::new();
        let mut captured = Vec::new();
        self.root
            .collect_matches(&segments, &mut captured, 0, &mut results);
        results.sort_by_key(|m| m.rank());
        results
    }

    /// Most specific match: literal segments first, then params, `*` last.
    pub fn best_match(&self, path: &str) -> Option<RouteMatch<T>> {
        self.match_path(path).into_iter().next()
    }
}

impl<T: Clone> Default for RouteTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> TrieNode<T> {
    fn insert(&mut self, segments: &[&str], entry: Entry<T>) {
        let Some((first, rest)) = segments.split_first() else {
            self.values.push(entry);
            return;
        };

        match *first {
            // `*` swallows the remainder; anything after it is ignored.
            "*" => self.rest.push(entry),
            seg if seg.starts_with(':') => {
                let child = self.param.get_or_insert_with(|| Box::new(TrieNode::default()));
                child.insert(rest, entry);
            }
            seg => {
                let child = self.children.entry(seg.to_string()).or_default();
                child.insert(rest, entry);
            }
        }
    }

    fn collect_matches(
        &self,
        segments: &[&str],
        captured: &mut Vec<String>,
        literal: usize,
        results: &mut Vec<RouteMatch<T>>,
    ) {
        // `*` also matches zero remaining segments.
        for entry in &self.rest {
            let mut m = entry.to_match(captured, literal, true);
            m.params.push((WILDCARD.to_string(), segments.join("/")));
            results.push(m);
        }

        let Some((first, rest)) = segments.split_first() else {
            for entry in &self.values {
                results.push(entry.to_match(captured, literal, false));
            }
            return;
        };

        if let Some(child) = self.children.get(*first) {
            child.collect_matches(rest, captured, literal + 1, results);
        }

        if let Some(ref param) = self.param {
            captured.push((*first).to_string());
            param.collect_matches(rest, captured, literal, results);
            captured.pop();
        }
    }
}

impl<T: Clone> Entry<T> {
    fn to_match(&self, captured: &[String], literal: usize, wildcard: bool) -> RouteMatch<T> {
        RouteMatch {
            value: self.value.clone(),
            params: self
                .params
                .iter()
                .cloned()
                .zip(captured.iter().cloned())
                .collect(),
            literal,
            dynamic: captured.len(),
            wildcard,
            seq: self.seq,
        }
    }
}

/// Expand `:x?` segments into every with/without combination.
/// Segments are returned with the trailing `?` removed.
fn expand_optional(pattern: &str) -> Vec<Vec<&str>> {
    let mut variants: Vec<Vec<&str>> = vec![Vec::new()];
    for seg in pattern.split('/').filter(|s| !s.is_empty()) {
        match seg.strip_suffix('?').filter(|_| seg.starts_with(':')) {
            Some(required) => {
                let without = variants.clone();
                for v in &mut variants {
                    v.push(required);
                }
                variants.extend(without);
            }
            None => {
                for v in &mut variants {
                    v.push(seg);
                }
            }
        }
    }
    variants
}
