// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Hoist Pattern Matcher (spec §4.3) and the `--scope`/`--ignore` package
//! filter (SPEC_FULL §B.1), both built on the same glob engine.

use glob::Pattern;

/// A compiled set of include/exclude glob patterns over a bare name (no
/// path component) — shared machinery behind hoist patterns and package
/// scope filters.
#[derive(Debug, Clone)]
pub struct NamePatterns {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl NamePatterns {
    /// Compiles `include`/`exclude` glob strings. Invalid globs are
    /// dropped rather than failing the whole run.
    pub fn compile(include: &[String], exclude: &[String]) -> Self {
        let compile = |patterns: &[String]| -> Vec<Pattern> {
            patterns
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect()
        };

        Self {
            include: compile(include),
            exclude: compile(exclude),
        }
    }

    /// True iff `name` matches any include pattern and no exclude pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.include.iter().any(|p| p.matches(name)) && !self.excluded(name)
    }

    fn excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(name))
    }
}

/// A name is hoistable iff it matches any include pattern and no exclude
/// pattern (spec §4.3). `include` is `None` when hoisting is disabled
/// entirely, in which case nothing is hoistable regardless of `exclude`.
/// When hoisting is enabled with no explicit patterns (`hoist = true`),
/// callers resolve that to a single `"**"` include pattern before calling
/// this function, which is what gives "all match" semantics.
pub fn is_hoistable(name: &str, include: Option<&NamePatterns>, exclude: &NamePatterns) -> bool {
    match include {
        None => false,
        Some(include) => include.include.iter().any(|p| p.matches(name)) && !exclude.excluded(name),
    }
}

/// Whether a package named `name` belongs to the filtered set the
/// orchestrator and planner operate on (SPEC_FULL §B.1): it matches
/// `scope` (or `scope` is empty, meaning "everything") and does not match
/// `ignore`.
pub fn package_is_selected(name: &str, scope: &[String], ignore: &[String]) -> bool {
    let exclude = NamePatterns::compile(&[], ignore);

    if scope.is_empty() {
        return !exclude.excluded(name);
    }

    let include = NamePatterns::compile(scope, ignore);
    include.matches(name)
}

/// Resolves the `hoist` config option (spec §6) into include patterns, or
/// `None` if hoisting is disabled.
pub fn resolve_hoist_patterns(hoist: Option<&crate::config::HoistSpec>) -> Option<NamePatterns> {
    use crate::config::HoistSpec;

    match hoist {
        None => None,
        Some(HoistSpec::All) => Some(NamePatterns::compile(&["**".to_owned()], &[])),
        Some(HoistSpec::Patterns(patterns)) => Some(NamePatterns::compile(patterns, &[])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HoistSpec;

    #[test]
    fn disabled_hoisting_is_never_hoistable() {
        let exclude = NamePatterns::compile(&[], &[]);
        assert!(!is_hoistable("left-pad", None, &exclude));
    }

    #[test]
    fn wildcard_matches_everything_except_excluded() {
        let include = resolve_hoist_patterns(Some(&HoistSpec::All)).unwrap();
        let exclude = NamePatterns::compile(&[], &["@internal/*".to_owned()]);

        assert!(is_hoistable("left-pad", Some(&include), &exclude));
        assert!(!is_hoistable("@internal/secret", Some(&include), &exclude));
    }

    #[test]
    fn explicit_include_patterns_restrict_matches() {
        let include =
            resolve_hoist_patterns(Some(&HoistSpec::Patterns(vec!["react*".to_owned()]))).unwrap();
        let exclude = NamePatterns::compile(&[], &[]);

        assert!(is_hoistable("react", Some(&include), &exclude));
        assert!(is_hoistable("react-dom", Some(&include), &exclude));
        assert!(!is_hoistable("left-pad", Some(&include), &exclude));
    }

    #[test]
    fn scope_filter_matches_include_and_not_exclude() {
        let scope = NamePatterns::compile(&["@acme/*".to_owned()], &["@acme/internal-*".to_owned()]);

        assert!(scope.matches("@acme/widgets"));
        assert!(!scope.matches("@acme/internal-tools"));
        assert!(!scope.matches("@other/widgets"));
    }

    #[test]
    fn empty_scope_selects_everything_not_ignored() {
        assert!(package_is_selected("a", &[], &[]));
        assert!(!package_is_selected("a", &[], &["a".to_owned()]));
    }

    #[test]
    fn non_empty_scope_restricts_selection() {
        assert!(package_is_selected("react", &["react*".to_owned()], &[]));
        assert!(!package_is_selected("left-pad", &["react*".to_owned()], &[]));
    }
}
