//! Page Object Tree
//!
//! Static descriptors of the page under test. Each named node carries a
//! driver-interpreted selector and its own named children; a node is either
//! a single element or a collection of zero-or-many siblings.
//!
//! Trees are registered once on a [`PageTree`] and never mutated while paths
//! are being resolved.

use std::collections::btree_map::{self, BTreeMap};

/// Strip all whitespace from an element name so `"Child Item"` and
/// `"ChildItem"` address the same member.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Named children of a node, keyed by normalized name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(BTreeMap<String, PageNode>);

impl Children {
    /// Create an empty child map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a child, returning the entry it replaced
    pub fn insert(&mut self, name: &str, node: PageNode) -> Option<PageNode> {
        self.0.insert(normalize_name(name), node)
    }

    /// Look up a child by (un-normalized) name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PageNode> {
        self.0.get(&normalize_name(name))
    }

    /// Whether a child with this name exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Merge `other` into `self`; entries of `other` win on conflict
    pub fn merge(&mut self, other: Children) {
        self.0.extend(other.0);
    }

    /// Normalized child names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over `(name, node)` pairs
    pub fn iter(&self) -> btree_map::Iter<'_, String, PageNode> {
        self.0.iter()
    }

    /// Number of children
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>> FromIterator<(K, PageNode)> for Children {
    fn from_iter<I: IntoIterator<Item = (K, PageNode)>>(iter: I) -> Self {
        let mut children = Self::new();
        for (name, node) in iter {
            let _ = children.insert(name.as_ref(), node);
        }
        children
    }
}

impl IntoIterator for Children {
    type Item = (String, PageNode);
    type IntoIter = btree_map::IntoIter<String, PageNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = (&'a String, &'a PageNode);
    type IntoIter = btree_map::Iter<'a, String, PageNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A named descriptor in the page-object tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageNode {
    /// Exactly one element
    Single {
        /// Locator interpreted by the driver
        selector: String,
        /// Nested members
        children: Children,
    },
    /// Zero-or-many sibling elements matched by one selector
    Collection {
        /// Locator interpreted by the driver
        selector: String,
        /// Nested members of every collection item
        children: Children,
    },
}

impl PageNode {
    /// Single-element node
    #[must_use]
    pub fn element(selector: impl Into<String>) -> Self {
        Self::Single {
            selector: selector.into(),
            children: Children::new(),
        }
    }

    /// Collection node
    #[must_use]
    pub fn collection(selector: impl Into<String>) -> Self {
        Self::Collection {
            selector: selector.into(),
            children: Children::new(),
        }
    }

    /// Add a nested child
    #[must_use]
    pub fn with_child(mut self, name: &str, node: PageNode) -> Self {
        let _ = self.children_mut().insert(name, node);
        self
    }

    /// Merge a set of nested children
    #[must_use]
    pub fn with_children(mut self, children: Children) -> Self {
        self.children_mut().merge(children);
        self
    }

    /// The node's selector
    #[must_use]
    pub fn selector(&self) -> &str {
        match self {
            Self::Single { selector, .. } | Self::Collection { selector, .. } => selector,
        }
    }

    /// The node's children
    #[must_use]
    pub const fn children(&self) -> &Children {
        match self {
            Self::Single { children, .. } | Self::Collection { children, .. } => children,
        }
    }

    /// Whether this node denotes a collection
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }

    fn children_mut(&mut self) -> &mut Children {
        match self {
            Self::Single { children, .. } | Self::Collection { children, .. } => children,
        }
    }
}

/// Type-level page-object declaration.
///
/// Implemented by hand or with `#[derive(PageObject)]` (feature `derive`):
///
/// ```ignore
/// #[derive(PageObject)]
/// struct App {
///     #[element(".single-element")]
///     single_element: Leaf,
///     #[collection(".list li")]
///     list: Leaf,
///     #[element(".container")]
///     single_component: SingleComponent,
/// }
///
/// engine.register_page::<App>();
/// ```
pub trait PageObject {
    /// Named members declared by this page or component
    fn children() -> Children;
}

/// Page object without nested members
#[derive(Debug, Clone, Copy, Default)]
pub struct Leaf;

impl PageObject for Leaf {
    fn children() -> Children {
        Children::new()
    }
}

/// Root of all registered page objects
#[derive(Debug, Clone, Default)]
pub struct PageTree {
    root: Children,
}

impl PageTree {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge top-level nodes into the root; later registrations overwrite
    /// same-named entries
    pub fn register<K, I>(&mut self, nodes: I)
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, PageNode)>,
    {
        for (name, node) in nodes {
            let _ = self.root.insert(name.as_ref(), node);
        }
    }

    /// Register the members of a declared page object
    pub fn register_page<P: PageObject>(&mut self) {
        self.root.merge(P::children());
    }

    /// Top-level nodes
    #[must_use]
    pub const fn root(&self) -> &Children {
        &self.root
    }

    /// Get a top-level node by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PageNode> {
        self.root.get(name)
    }

    /// Normalized top-level names
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.root.names().collect()
    }

    /// Number of top-level nodes
    #[must_use]
    pub fn count(&self) -> usize {
        self.root.len()
    }
}
