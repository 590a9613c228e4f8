// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Version Matcher (spec §4.1): a thin, fallible wrapper around the
//! standard semver grammar used everywhere else in this crate.

use semver::{Version, VersionReq};

use crate::errors::BootstrapError;

/// Parses a concrete version, mapping grammar failures to [`BootstrapError::BadVersionSpec`].
pub fn parse_version(spec: &str) -> Result<Version, BootstrapError> {
    Version::parse(spec).map_err(|source| BootstrapError::BadVersionSpec {
        spec: spec.to_owned(),
        source: Some(source),
    })
}

/// Parses a range expression, mapping grammar failures to [`BootstrapError::BadVersionSpec`].
pub fn parse_range(spec: &str) -> Result<VersionReq, BootstrapError> {
    VersionReq::parse(spec).map_err(|source| BootstrapError::BadVersionSpec {
        spec: spec.to_owned(),
        source: Some(source),
    })
}

/// Whether `version` satisfies `range`, per standard semver semantics
/// (exact, caret, tilde, X-ranges, comparator unions).
pub fn satisfies(version: &Version, range: &VersionReq) -> bool {
    range.matches(version)
}
