//! Property tests for route tree matching.

use std::collections::BTreeSet;

use proptest::prelude::*;
use trellis_router::{Params, Tree};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_.-]{1,8}"
}

fn static_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|segments| format!("/{}", segments.join("/")))
}

proptest! {
    #[test]
    fn prop_static_paths_round_trip(paths in prop::collection::btree_set(static_path(), 1..40)) {
        let mut tree = Tree::new();
        for path in &paths {
            tree.insert(path, path.clone());
        }

        prop_assert_eq!(tree.len(), paths.len());
        for path in &paths {
            let (value, params) = tree.at(path).expect("registered path must match");
            prop_assert_eq!(value, path);
            prop_assert!(params.is_empty());
        }
    }

    #[test]
    fn prop_unregistered_static_paths_miss(
        paths in prop::collection::btree_set(static_path(), 1..20),
        probe in static_path(),
    ) {
        let mut tree = Tree::new();
        for path in &paths {
            tree.insert(path, ());
        }
        prop_assert_eq!(tree.contains(&probe), paths.contains(&probe));
    }

    #[test]
    fn prop_params_bound_in_pattern_order(
        literals in prop::collection::vec(segment(), 1..4),
        values in prop::collection::vec(segment(), 4),
    ) {
        let mut pattern = String::new();
        let mut path = String::new();
        for (i, literal) in literals.iter().enumerate() {
            pattern.push_str(&format!("/{literal}/:p{i}"));
            path.push_str(&format!("/{literal}/{}", values[i]));
        }

        let mut tree = Tree::new();
        tree.insert(&pattern, ());

        let mut params = Params::new();
        let lookup = tree.find(&path, &mut params);
        prop_assert!(lookup.value.is_some());
        prop_assert_eq!(params.len(), literals.len());
        for (i, (name, value)) in params.iter().enumerate() {
            let expected_name = format!("p{i}");
            prop_assert_eq!(name, expected_name.as_str());
            prop_assert_eq!(value, values[i].as_str());
        }
    }

    #[test]
    fn prop_catch_all_binds_remainder(rest in prop::collection::vec(segment(), 0..6)) {
        let mut tree = Tree::new();
        tree.insert("/files/*rest", ());

        let remainder = rest.join("/");
        let (_, params) = tree
            .at(&format!("/files/{remainder}"))
            .expect("catch-all must match");
        prop_assert_eq!(params.get("rest"), Some(remainder.as_str()));
    }

    #[test]
    fn prop_trailing_slash_hint_is_not_a_hit(path in static_path()) {
        let mut tree = Tree::new();
        tree.insert(&format!("{path}/"), ());

        let mut params = Params::new();
        let lookup = tree.find(&path, &mut params);
        prop_assert!(lookup.value.is_none());
        prop_assert!(lookup.tsr);
    }
}

#[test]
fn test_static_and_param_siblings() {
    let mut tree = Tree::new();
    tree.insert("/user/new", "static");
    tree.insert("/user/:id", "param");

    assert_eq!(tree.at("/user/new").map(|(v, _)| *v), Some("static"));
    let (value, params) = tree.at("/user/99").unwrap();
    assert_eq!(*value, "param");
    assert_eq!(params.get("id"), Some("99"));
}

#[test]
fn test_routes_are_unique() {
    let mut tree = Tree::new();
    let patterns: BTreeSet<_> = ["/a", "/b/:id", "/a", "/c/*rest"].into_iter().collect();
    for pattern in ["/a", "/b/:id", "/a", "/c/*rest"] {
        tree.insert(pattern, ());
    }
    let routes: BTreeSet<_> = tree.routes().collect();
    assert_eq!(routes, patterns);
}
