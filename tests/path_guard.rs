//! Property tests for working-root confinement.

mod common;

use common::TestContext;
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("..".to_string()),
        1 => Just(".".to_string()),
        4 => "[a-z]{1,6}",
    ]
}

/// Lowest depth reached while walking the segments from the root.
fn min_depth(segments: &[String]) -> i32 {
    let mut depth = 0;
    let mut min = 0;
    for seg in segments {
        match seg.as_str() {
            ".." => depth -= 1,
            "." => {}
            _ => depth += 1,
        }
        min = min.min(depth);
    }
    min
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn proptest_resolve_confines_to_root(segments in prop::collection::vec(segment(), 1..8)) {
        let ctx = TestContext::new();
        let root = ctx.root();
        let candidate = segments.join("/");

        let escapes = min_depth(&segments) < 0;
        match root.resolve(&candidate, "read") {
            Ok(resolved) => {
                prop_assert!(!escapes, "{candidate} escaped but resolved to {}", resolved.display());
                prop_assert!(resolved.starts_with(root.path()));
            }
            Err(err) => {
                prop_assert!(escapes, "{candidate} stays inside but was rejected: {err}");
                prop_assert!(err.is_security_related());
            }
        }
    }
}

#[test]
fn test_min_depth() {
    let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>();
    assert_eq!(min_depth(&s(&["a", "..", "b"])), 0);
    assert_eq!(min_depth(&s(&["a", "..", ".."])), -1);
    assert_eq!(min_depth(&s(&["..", "a", "b"])), -1);
}
