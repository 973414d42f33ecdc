//! Radix tree route matching.
//!
//! Every node stores a byte prefix. Static children are dispatched on the
//! first byte of their prefix, so at most one static child is tried per
//! node. A node may additionally carry one parameter child (`:name`, binds a
//! single non-empty segment) and one catch-all child (`*name`, binds the rest
//! of the path). Matching prefers the static branch, then the parameter,
//! then the catch-all.

use crate::params::Params;

/// What a node matches once its parent has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    /// Literal bytes, stored in the node prefix.
    Static,
    /// A named parameter matching one path segment.
    Param(String),
    /// A named catch-all matching the remainder of the path.
    CatchAll(String),
}

/// A node in the route tree.
#[derive(Debug, Clone)]
struct Node<T> {
    prefix: Vec<u8>,
    kind: NodeKind,
    /// First byte of each static child, parallel to `children`.
    indices: Vec<u8>,
    children: Vec<Node<T>>,
    param: Option<Box<Node<T>>>,
    catch_all: Option<Box<Node<T>>>,
    value: Option<T>,
}

impl<T> Node<T> {
    fn new(prefix: &[u8], kind: NodeKind) -> Self {
        Self {
            prefix: prefix.to_vec(),
            kind,
            indices: Vec::new(),
            children: Vec::new(),
            param: None,
            catch_all: None,
            value: None,
        }
    }

    fn wildcard_name(&self) -> &str {
        match &self.kind {
            NodeKind::Param(name) | NodeKind::CatchAll(name) => name,
            NodeKind::Static => "",
        }
    }

    /// Attaches `segments` below this node, which has already been matched.
    fn insert(&mut self, pattern: &str, segments: &[Segment<'_>], value: T) {
        let Some((segment, rest)) = segments.split_first() else {
            self.value = Some(value);
            return;
        };

        match *segment {
            Segment::Static(text) => self.insert_static(pattern, text.as_bytes(), rest, value),
            Segment::Param(name) => {
                assert!(
                    self.catch_all.is_none(),
                    "parameter ':{name}' in path '{pattern}' conflicts with an existing catch-all"
                );
                let child = self
                    .param
                    .get_or_insert_with(|| Box::new(Node::new(b"", NodeKind::Param(name.to_string()))));
                assert!(
                    child.wildcard_name() == name,
                    "parameter ':{name}' in path '{pattern}' conflicts with existing parameter ':{}'",
                    child.wildcard_name()
                );
                child.insert(pattern, rest, value);
            }
            Segment::CatchAll(name) => {
                assert!(
                    self.children.is_empty() && self.param.is_none(),
                    "catch-all '*{name}' in path '{pattern}' conflicts with existing routes at the same position"
                );
                let child = self
                    .catch_all
                    .get_or_insert_with(|| Box::new(Node::new(b"", NodeKind::CatchAll(name.to_string()))));
                assert!(
                    child.wildcard_name() == name,
                    "catch-all '*{name}' in path '{pattern}' conflicts with existing catch-all '*{}'",
                    child.wildcard_name()
                );
                child.value = Some(value);
            }
        }
    }

    fn insert_static(&mut self, pattern: &str, text: &[u8], rest: &[Segment<'_>], value: T) {
        assert!(
            self.catch_all.is_none(),
            "path '{pattern}' conflicts with an existing catch-all at the same position"
        );

        let Some(index) = self.indices.iter().position(|&b| b == text[0]) else {
            let mut child = Node::new(text, NodeKind::Static);
            child.insert(pattern, rest, value);
            self.indices.push(text[0]);
            self.children.push(child);
            return;
        };

        let child = &mut self.children[index];
        let common = common_prefix(&child.prefix, text);

        if common < child.prefix.len() {
            child.split_at(common);
        }

        if common == text.len() {
            child.insert(pattern, rest, value);
        } else {
            child.insert_static(pattern, &text[common..], rest, value);
        }
    }

    /// Moves everything after `at` into a new child, keeping `prefix[..at]`.
    fn split_at(&mut self, at: usize) {
        let suffix = self.prefix.split_off(at);
        let tail = Node {
            prefix: suffix,
            kind: NodeKind::Static,
            indices: std::mem::take(&mut self.indices),
            children: std::mem::take(&mut self.children),
            param: self.param.take(),
            catch_all: self.catch_all.take(),
            value: self.value.take(),
        };
        self.indices.push(tail.prefix[0]);
        self.children.push(tail);
    }

    /// Matches `path[pos..]` against the children of this node.
    fn find<'n>(&'n self, path: &str, pos: usize, params: &mut Params) -> Option<&'n T> {
        if pos == path.len() {
            if let Some(value) = &self.value {
                return Some(value);
            }
            if let Some(catch_all) = &self.catch_all {
                params.push(catch_all.wildcard_name(), "");
                return catch_all.value.as_ref();
            }
            return None;
        }

        let rest = &path.as_bytes()[pos..];

        if let Some(index) = self.indices.iter().position(|&b| b == rest[0]) {
            let child = &self.children[index];
            if rest.starts_with(&child.prefix) {
                if let Some(value) = child.find(path, pos + child.prefix.len(), params) {
                    return Some(value);
                }
            }
        }

        if let Some(param) = &self.param {
            let end = rest
                .iter()
                .position(|&b| b == b'/')
                .map_or(path.len(), |offset| pos + offset);
            if end > pos {
                let mark = params.len();
                params.push(param.wildcard_name(), &path[pos..end]);
                if let Some(value) = param.find(path, end, params) {
                    return Some(value);
                }
                params.truncate(mark);
            }
        }

        if let Some(catch_all) = &self.catch_all {
            params.push(catch_all.wildcard_name(), &path[pos..]);
            return catch_all.value.as_ref();
        }

        None
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// One parsed piece of a route pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'p> {
    Static(&'p str),
    Param(&'p str),
    CatchAll(&'p str),
}

/// Splits a pattern into static text, parameters and a trailing catch-all.
fn parse_pattern(pattern: &str) -> Vec<Segment<'_>> {
    assert!(!pattern.is_empty(), "route path must not be empty");
    assert!(
        pattern.starts_with('/'),
        "route path must begin with '/' in path '{pattern}'"
    );

    let bytes = pattern.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let marker = bytes[i];
        if marker != b':' && marker != b'*' {
            i += 1;
            continue;
        }

        assert!(
            bytes[i - 1] == b'/',
            "wildcards must start a path segment in path '{pattern}'"
        );
        if start < i {
            segments.push(Segment::Static(&pattern[start..i]));
        }

        let end = pattern[i + 1..]
            .find('/')
            .map_or(pattern.len(), |offset| i + 1 + offset);
        let name = &pattern[i + 1..end];
        assert!(
            !name.is_empty(),
            "wildcards must be named with a non-empty name in path '{pattern}'"
        );
        assert!(
            !name.contains([':', '*']),
            "only one wildcard per path segment is allowed, has '{name}' in path '{pattern}'"
        );

        if marker == b':' {
            segments.push(Segment::Param(name));
        } else {
            assert!(
                end == pattern.len(),
                "catch-all routes are only allowed at the end of the path in path '{pattern}'"
            );
            segments.push(Segment::CatchAll(name));
        }

        i = end;
        start = end;
    }

    if start < bytes.len() {
        segments.push(Segment::Static(&pattern[start..]));
    }

    segments
}

/// Result of [`Tree::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup<'t, T> {
    /// The value registered under the matching pattern.
    pub value: Option<&'t T>,
    /// Set when there is no exact match but toggling the trailing slash of
    /// the path would produce one.
    pub tsr: bool,
}

/// A radix tree mapping path patterns to values.
///
/// Patterns are built from literal text, `:name` parameters that match one
/// non-empty segment, and a final `*name` catch-all that matches the rest of
/// the path. Conflicting registrations panic, as they indicate a broken route
/// table.
///
/// # Example
///
/// ```rust
/// use trellis_router::{Params, Tree};
///
/// let mut tree = Tree::new();
/// tree.insert("/user/new", "create");
/// tree.insert("/user/:id/post/:pid", "post");
/// tree.insert("/files/*rest", "files");
///
/// let mut params = Params::new();
/// let lookup = tree.find("/user/42/post/7", &mut params);
/// assert_eq!(lookup.value, Some(&"post"));
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("pid"), Some("7"));
///
/// let (value, params) = tree.at("/files/a/b/c").unwrap();
/// assert_eq!(*value, "files");
/// assert_eq!(params.get("rest"), Some("a/b/c"));
/// ```
#[derive(Debug, Clone)]
pub struct Tree<T> {
    root: Node<T>,
    patterns: Vec<String>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::new(b"", NodeKind::Static),
            patterns: Vec::new(),
        }
    }

    /// Registers `value` under `pattern`.
    ///
    /// Registering the same pattern again replaces the stored value.
    ///
    /// # Panics
    ///
    /// Panics when the pattern is empty, does not begin with `/`, contains an
    /// unnamed or misplaced wildcard, or is ambiguous with a pattern already
    /// in the tree.
    pub fn insert(&mut self, pattern: &str, value: T) {
        let segments = parse_pattern(pattern);
        self.root.insert(pattern, &segments, value);
        if !self.patterns.iter().any(|p| p == pattern) {
            self.patterns.push(pattern.to_string());
        }
    }

    /// Looks up `path`, appending parameter bindings to `params`.
    ///
    /// On a miss `params` is left as it was passed in.
    pub fn find<'t>(&'t self, path: &str, params: &mut Params) -> Lookup<'t, T> {
        if let Some(value) = self.root.find(path, 0, params) {
            return Lookup {
                value: Some(value),
                tsr: false,
            };
        }

        Lookup {
            value: None,
            tsr: self.slash_toggled_exists(path),
        }
    }

    fn slash_toggled_exists(&self, path: &str) -> bool {
        let mut scratch = Params::new();
        if path.len() > 1 && path.ends_with('/') {
            self.root
                .find(&path[..path.len() - 1], 0, &mut scratch)
                .is_some()
        } else {
            let toggled = format!("{path}/");
            self.root.find(&toggled, 0, &mut scratch).is_some()
        }
    }

    /// Looks up `path`, returning the value and a fresh parameter set.
    #[must_use]
    pub fn at(&self, path: &str) -> Option<(&T, Params)> {
        let mut params = Params::new();
        self.root.find(path, 0, &mut params).map(|value| (value, params))
    }

    /// Returns true if `path` matches a registered pattern exactly.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.at(path).is_some()
    }

    /// Returns the number of registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no pattern has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the registered patterns in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(patterns: &[&'static str]) -> Tree<&'static str> {
        let mut tree = Tree::new();
        for pattern in patterns {
            tree.insert(pattern, *pattern);
        }
        tree
    }

    #[test]
    fn test_parse_pattern_static() {
        assert_eq!(
            parse_pattern("/users/list"),
            vec![Segment::Static("/users/list")]
        );
    }

    #[test]
    fn test_parse_pattern_wildcards() {
        assert_eq!(
            parse_pattern("/user/:id/files/*rest"),
            vec![
                Segment::Static("/user/"),
                Segment::Param("id"),
                Segment::Static("/files/"),
                Segment::CatchAll("rest"),
            ]
        );
    }

    #[test]
    fn test_static_round_trip() {
        let tree = tree(&["/", "/users", "/users/list", "/posts", "/post"]);
        for pattern in ["/", "/users", "/users/list", "/posts", "/post"] {
            let (value, params) = tree.at(pattern).unwrap();
            assert_eq!(*value, pattern);
            assert!(params.is_empty());
        }
        assert!(tree.at("/user").is_none());
        assert!(tree.at("/postsx").is_none());
    }

    #[test]
    fn test_prefix_split_keeps_earlier_routes() {
        let tree = tree(&["/search", "/support", "/src", "/s"]);
        assert_eq!(tree.at("/search").map(|(v, _)| *v), Some("/search"));
        assert_eq!(tree.at("/support").map(|(v, _)| *v), Some("/support"));
        assert_eq!(tree.at("/src").map(|(v, _)| *v), Some("/src"));
        assert_eq!(tree.at("/s").map(|(v, _)| *v), Some("/s"));
        assert!(tree.at("/se").is_none());
    }

    #[test]
    fn test_non_ascii_prefix_split() {
        let tree = tree(&["/caf\u{e9}", "/caf\u{e8}"]);
        assert!(tree.contains("/caf\u{e9}"));
        assert!(tree.contains("/caf\u{e8}"));
        assert!(!tree.contains("/caf"));
    }

    #[test]
    fn test_param_extraction_order() {
        let tree = tree(&["/user/:id/post/:pid"]);
        let (value, params) = tree.at("/user/42/post/7").unwrap();
        assert_eq!(*value, "/user/:id/post/:pid");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("id", "42"), ("pid", "7")]);
    }

    #[test]
    fn test_param_requires_non_empty_segment() {
        let tree = tree(&["/user/:id"]);
        assert!(tree.at("/user/").is_none());
        assert!(tree.at("/user/1/extra").is_none());
    }

    #[test]
    fn test_catch_all() {
        let tree = tree(&["/files/*rest"]);
        let (_, params) = tree.at("/files/a/b/c").unwrap();
        assert_eq!(params.get("rest"), Some("a/b/c"));

        let (_, params) = tree.at("/files/").unwrap();
        assert_eq!(params.get("rest"), Some(""));
    }

    #[test]
    fn test_static_precedence_over_param() {
        let tree = tree(&["/user/new", "/user/:id"]);
        let (value, params) = tree.at("/user/new").unwrap();
        assert_eq!(*value, "/user/new");
        assert!(params.is_empty());

        let (value, params) = tree.at("/user/99").unwrap();
        assert_eq!(*value, "/user/:id");
        assert_eq!(params.get("id"), Some("99"));

        let (value, params) = tree.at("/user/newer").unwrap();
        assert_eq!(*value, "/user/:id");
        assert_eq!(params.get("id"), Some("newer"));
    }

    #[test]
    fn test_static_branch_falls_back_to_param() {
        let tree = tree(&["/user/new", "/user/:id/profile"]);
        let (value, params) = tree.at("/user/new/profile").unwrap();
        assert_eq!(*value, "/user/:id/profile");
        assert_eq!(params.get("id"), Some("new"));
    }

    #[test]
    fn test_failed_branch_rolls_back_params() {
        let tree = tree(&["/a/:x/b", "/a/:x/c/:y"]);
        let mut params = Params::new();
        let lookup = tree.find("/a/1/d", &mut params);
        assert!(lookup.value.is_none());
        assert!(params.is_empty());
    }

    #[test]
    fn test_trailing_slash_hint() {
        let tree = tree(&["/a/b/", "/c"]);
        let mut params = Params::new();

        let lookup = tree.find("/a/b", &mut params);
        assert!(lookup.value.is_none());
        assert!(lookup.tsr);

        let lookup = tree.find("/c/", &mut params);
        assert!(lookup.value.is_none());
        assert!(lookup.tsr);

        let lookup = tree.find("/a/b/", &mut params);
        assert!(lookup.value.is_some());
        assert!(!lookup.tsr);

        let lookup = tree.find("/d", &mut params);
        assert!(!lookup.tsr);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut tree = Tree::new();
        tree.insert("/users", 1);
        tree.insert("/users", 2);
        assert_eq!(tree.at("/users").map(|(v, _)| *v), Some(2));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_routes_listing() {
        let tree = tree(&["/b", "/a/:id"]);
        assert_eq!(tree.routes().collect::<Vec<_>>(), vec!["/b", "/a/:id"]);
        assert!(!tree.is_empty());
    }

    #[test]
    #[should_panic(expected = "conflicts with existing parameter")]
    fn test_conflicting_param_names_panic() {
        tree(&["/user/:id", "/user/:name"]);
    }

    #[test]
    #[should_panic(expected = "conflicts with existing routes")]
    fn test_catch_all_beside_static_panics() {
        tree(&["/files/list", "/files/*rest"]);
    }

    #[test]
    #[should_panic(expected = "conflicts with an existing catch-all")]
    fn test_static_beside_catch_all_panics() {
        tree(&["/files/*rest", "/files/list"]);
    }

    #[test]
    #[should_panic(expected = "conflicts with existing catch-all '*a'")]
    fn test_renamed_catch_all_panics() {
        tree(&["/f/*a", "/f/*b"]);
    }

    #[test]
    #[should_panic(expected = "parameter ':id' in path '/f/:id' conflicts with an existing catch-all")]
    fn test_param_beside_catch_all_panics() {
        tree(&["/f/*a", "/f/:id"]);
    }

    #[test]
    #[should_panic(expected = "conflicts with existing routes")]
    fn test_catch_all_beside_param_panics() {
        tree(&["/f/:id", "/f/*a"]);
    }

    #[test]
    #[should_panic(expected = "only allowed at the end")]
    fn test_catch_all_must_be_last() {
        tree(&["/files/*rest/more"]);
    }

    #[test]
    #[should_panic(expected = "must begin with '/'")]
    fn test_missing_leading_slash_panics() {
        tree(&["users"]);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn test_empty_pattern_panics() {
        tree(&[""]);
    }

    #[test]
    #[should_panic(expected = "non-empty name")]
    fn test_unnamed_param_panics() {
        tree(&["/user/:"]);
    }

    #[test]
    #[should_panic(expected = "must start a path segment")]
    fn test_wildcard_inside_segment_panics() {
        tree(&["/user_:id"]);
    }
}
