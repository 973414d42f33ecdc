//! One route tree per HTTP method.

use http::Method;

use crate::tree::Tree;

/// Ordered table of `(method, tree)` pairs.
///
/// Trees are created the first time a method is registered and are never
/// removed. The table is small (one entry per distinct method), so lookups
/// scan it linearly.
///
/// # Example
///
/// ```rust
/// use trellis_router::MethodTrees;
/// use http::Method;
///
/// let mut trees = MethodTrees::new();
/// trees.get_or_create(Method::GET).insert("/users", "list");
/// trees.get_or_create(Method::POST).insert("/users", "create");
///
/// assert_eq!(trees.len(), 2);
/// assert!(trees.get(&Method::DELETE).is_none());
/// assert_eq!(trees.allowed("/users"), vec![Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone)]
pub struct MethodTrees<T> {
    trees: Vec<(Method, Tree<T>)>,
}

impl<T> Default for MethodTrees<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MethodTrees<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            // Room for the common methods without regrowing.
            trees: Vec::with_capacity(9),
        }
    }

    /// Returns the tree registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&Tree<T>> {
        self.trees
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, tree)| tree)
    }

    /// Returns the tree for `method`, creating an empty one if needed.
    pub fn get_or_create(&mut self, method: Method) -> &mut Tree<T> {
        let index = match self.trees.iter().position(|(m, _)| *m == method) {
            Some(index) => index,
            None => {
                self.trees.push((method, Tree::new()));
                self.trees.len() - 1
            }
        };
        &mut self.trees[index].1
    }

    /// Iterates over the table in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &Tree<T>)> {
        self.trees.iter().map(|(m, tree)| (m, tree))
    }

    /// Returns the methods that have a tree, in creation order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.trees.iter().map(|(m, _)| m)
    }

    /// Returns the methods whose tree matches `path` exactly.
    #[must_use]
    pub fn allowed(&self, path: &str) -> Vec<Method> {
        self.trees
            .iter()
            .filter(|(_, tree)| tree.contains(path))
            .map(|(m, _)| m.clone())
            .collect()
    }

    /// Returns the number of methods with a tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Returns true if no method has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}
