//! Path joining for route groups.

/// Joins a group base path with a relative route path.
///
/// Runs of `/` are collapsed and the result always begins with `/`. A
/// trailing slash on `relative` is preserved; an empty `relative` returns
/// the cleaned base unchanged.
///
/// # Example
///
/// ```rust
/// use trellis_router::join_paths;
///
/// assert_eq!(join_paths("/api/", "/users"), "/api/users");
/// assert_eq!(join_paths("/api", "users/"), "/api/users/");
/// assert_eq!(join_paths("/api", ""), "/api");
/// ```
#[must_use]
pub fn join_paths(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return clean_path(base);
    }

    let mut joined = String::with_capacity(base.len() + relative.len() + 1);
    joined.push_str(base);
    joined.push('/');
    joined.push_str(relative);
    clean_path(&joined)
}

/// Collapses runs of `/` and makes sure the path begins with `/`.
#[must_use]
pub fn clean_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for ch in path.chars() {
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    out
}
