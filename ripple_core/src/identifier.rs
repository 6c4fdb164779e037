//! Dotted names (`network.replica.0`, `u.add_rating`, `q.search_title`) and
//! a trie keyed by them, used both for the replica-directory address book
//! and for the domain-operation registry.

use ahash::AHashMap;
use itertools::Itertools;
use ripple_utils::IString;
use std::fmt;

pub type IdentifierSegment = IString;

const SEGMENT_SEPARATOR: &str = ".";

/// A dotted, segment-wise name such as `network.replica.0` or `u.add_rating`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    segments: Vec<IdentifierSegment>,
}

impl Identifier {
    pub fn from_array<I, const N: usize>(segments: [I; N]) -> Self
    where
        I: Into<IdentifierSegment>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect_vec(),
        }
    }

    /// Parses a dotted string into its segments. Never fails: an empty
    /// input yields a single empty segment, matching `str::split`.
    pub fn parse(s: &str) -> Self {
        Self {
            segments: s.split(SEGMENT_SEPARATOR).map(IString::from).collect_vec(),
        }
    }

    pub fn segments(&self) -> &[IdentifierSegment] {
        &self.segments
    }

    /// True if `self` is `prefix` followed by zero or more further segments.
    pub fn has_prefix(&self, prefix: &Identifier) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// The first segment, used to classify opcodes (`u.*` vs `q.*`).
    pub fn first_segment(&self) -> Option<&str> {
        self.segments.first().map(AsRef::as_ref)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.iter().join(SEGMENT_SEPARATOR))
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// A map keyed by [`Identifier`], stored as a trie over segments so that
/// prefix listing (`list("network.replica.")`) is a subtree walk rather
/// than a linear scan.
#[derive(Clone, Debug)]
pub struct TrieMap<V> {
    root: TrieNode<V>,
}

#[derive(Clone, Debug)]
struct TrieNode<V> {
    value: Option<V>,
    children: AHashMap<IdentifierSegment, TrieNode<V>>,
}

impl<V> TrieNode<V> {
    fn empty() -> Self {
        Self {
            value: None,
            children: AHashMap::new(),
        }
    }
}

impl<V> Default for TrieMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TrieMap<V> {
    pub fn new() -> Self {
        Self {
            root: TrieNode::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.value.is_none() && self.root.children.is_empty()
    }

    pub fn insert(&mut self, key: Identifier, value: V) -> Option<V> {
        let mut node = &mut self.root;
        for segment in key.segments {
            node = node
                .children
                .entry(segment)
                .or_insert_with(TrieNode::empty);
        }
        node.value.replace(value)
    }

    pub fn remove(&mut self, key: &Identifier) -> Option<V> {
        let mut node = &mut self.root;
        for segment in &key.segments {
            node = node.children.get_mut(segment)?;
        }
        node.value.take()
    }

    pub fn get(&self, key: &Identifier) -> Option<&V> {
        let mut node = &self.root;
        for segment in &key.segments {
            node = node.children.get(segment)?;
        }
        node.value.as_ref()
    }

    /// All `(Identifier, &V)` pairs whose key starts with `prefix`.
    pub fn list_prefix(&self, prefix: &Identifier) -> Vec<(Identifier, &V)> {
        let mut node = &self.root;
        for segment in &prefix.segments {
            match node.children.get(segment) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        let mut out = Vec::new();
        collect(node, prefix.segments.clone(), &mut out);
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (Identifier, &V)> {
        let mut out = Vec::new();
        collect(&self.root, Vec::new(), &mut out);
        out.into_iter()
    }
}

fn collect<'a, V>(
    node: &'a TrieNode<V>,
    path: Vec<IdentifierSegment>,
    out: &mut Vec<(Identifier, &'a V)>,
) {
    if let Some(value) = node.value.as_ref() {
        out.push((
            Identifier {
                segments: path.clone(),
            },
            value,
        ));
    }
    for (segment, child) in &node.children {
        let mut child_path = path.clone();
        child_path.push(segment.clone());
        collect(child, child_path, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id<const N: usize>(segments: [&str; N]) -> Identifier {
        Identifier::from_array(segments)
    }

    #[test]
    fn insert_and_get() {
        let mut trie = TrieMap::new();
        trie.insert(id(["network", "replica", "0"]), 0usize);
        trie.insert(id(["network", "replica", "1"]), 1usize);
        trie.insert(id(["network", "frontend"]), 2usize);

        assert_eq!(trie.get(&id(["network", "replica", "0"])), Some(&0));
        assert_eq!(trie.get(&id(["network", "replica", "1"])), Some(&1));
        assert_eq!(trie.get(&id(["network", "replica", "2"])), None);
    }

    #[test]
    fn list_prefix_finds_only_matching_subtree() {
        let mut trie = TrieMap::new();
        trie.insert(id(["network", "replica", "0"]), 0usize);
        trie.insert(id(["network", "replica", "1"]), 1usize);
        trie.insert(id(["network", "frontend"]), 2usize);

        let replicas = trie.list_prefix(&id(["network", "replica"]));
        assert_eq!(replicas.len(), 2);
        let ids: Vec<_> = replicas.iter().map(|(_, v)| **v).sorted().collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn parse_and_display_roundtrip() {
        let parsed = Identifier::parse("network.replica.2");
        assert_eq!(parsed, id(["network", "replica", "2"]));
        assert_eq!(parsed.to_string(), "network.replica.2");
    }

    #[test]
    fn has_prefix() {
        let full = id(["network", "replica", "0"]);
        assert!(full.has_prefix(&id(["network", "replica"])));
        assert!(!full.has_prefix(&id(["network", "frontend"])));
    }
}

/// A name-only set, built on [`TrieMap`].
#[derive(Clone, Debug, Default)]
pub struct TrieSet(TrieMap<()>);

impl TrieSet {
    pub fn new() -> Self {
        Self(TrieMap::new())
    }

    pub fn insert(&mut self, key: Identifier) -> bool {
        self.0.insert(key, ()).is_none()
    }

    pub fn contains(&self, key: &Identifier) -> bool {
        self.0.get(key).is_some()
    }
}
