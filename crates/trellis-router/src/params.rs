//! Path parameters bound by a route match.
//!
//! [`Params`] keeps `(name, value)` pairs in the order the segments appear in
//! the route pattern. The backing storage is a small vector so typical routes
//! (up to four parameters) never touch the heap for the container itself, and
//! [`Params::clear`] keeps whatever capacity was grown so a pooled container
//! can be refilled request after request.

use smallvec::SmallVec;

/// Number of parameters stored inline.
const INLINE_PARAMS: usize = 4;

/// Ordered path parameters produced by a route match.
///
/// # Example
///
/// ```rust
/// use trellis_router::Params;
///
/// let mut params = Params::new();
/// params.push("id", "42");
/// params.push("pid", "7");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("pid"), Some("7"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty parameter set able to hold `capacity` pairs.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Appends a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value of the first parameter called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of `name`, or an empty string when it is absent.
    #[must_use]
    pub fn by_name(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns the parameters in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Shortens the set to `len` pairs, retaining allocated capacity.
    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Removes every pair, retaining allocated capacity.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns the number of pairs the set can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
