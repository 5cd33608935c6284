//! Restrict changed paths to a base directory.

use indexmap::IndexSet;

/// Keep each path that starts with `base_dir` and has not been seen earlier
/// in `paths`. First-occurrence order is preserved.
///
/// The check is a plain string prefix, so `force-app` also admits
/// `force-app-extra/...`; callers wanting a directory boundary pass a
/// trailing `/`.
pub fn filter_paths<S: AsRef<str>>(
    paths: &[S],
    base_dir: &str,
) -> Vec<String>
{
    let kept: IndexSet<&str> = paths
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| p.starts_with(base_dir))
        .collect();

    kept.into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence_and_prefix()
    {
        let input = ["b/x", "a/y", "b/x", "b/z"];
        assert_eq!(filter_paths(&input, "b"), vec!["b/x".to_string(), "b/z".to_string()]);
    }

    #[test]
    fn test_filter_is_idempotent()
    {
        let input = vec![
            "force-app/main/default/classes/Foo.cls".to_string(),
            "README.md".to_string(),
            "force-app/main/default/classes/Foo.cls-meta.xml".to_string(),
            "force-app/main/default/classes/Foo.cls".to_string(),
            "other/force-app/main/default/classes/Bar.cls".to_string(),
        ];
        let base = "force-app/main/default";

        let once = filter_paths(&input, base);
        let twice = filter_paths(&once, base);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_order_is_not_sorted()
    {
        let input = ["src/z.cls", "src/a.cls", "src/m.cls"];
        assert_eq!(filter_paths(&input, "src/"), vec!["src/z.cls", "src/a.cls", "src/m.cls"]);
    }

    #[test]
    fn test_empty_inputs()
    {
        let none: [&str; 0] = [];
        assert!(filter_paths(&none, "src").is_empty());

        // Empty base admits everything, still deduplicated
        assert_eq!(filter_paths(&["a", "a", "b"], ""), vec!["a", "b"]);
    }

    fn path_list() -> impl Strategy<Value = Vec<String>>
    {
        // Small alphabet so duplicates and shared prefixes are common
        prop::collection::vec("(src|docs|src-extra)/[ab]{0,2}(\\.cls)?", 0..24)
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent(paths in path_list(), base in "(src|docs|src/|)") {
            let once = filter_paths(&paths, &base);
            prop_assert_eq!(filter_paths(&once, &base), once);
        }

        #[test]
        fn prop_output_is_unique_prefixed_subsequence(paths in path_list(), base in "(src|docs/)") {
            let out = filter_paths(&paths, &base);

            let mut seen = std::collections::HashSet::new();
            prop_assert!(out.iter().all(|p| seen.insert(p.as_str())));
            prop_assert!(out.iter().all(|p| p.starts_with(&base)));

            // First occurrences, in input order
            let mut expected: Vec<String> = Vec::new();
            for p in paths.iter().filter(|p| p.starts_with(&base))
            {
                if !expected.contains(p)
                {
                    expected.push(p.clone());
                }
            }
            prop_assert_eq!(out, expected);
        }
    }
}
