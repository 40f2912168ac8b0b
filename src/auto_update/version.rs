// Version Comparison
// Validates and orders the version strings found in release histories.
// A leading `v` and a missing minor or patch component are tolerated
// (`v1.2` reads as `1.2.0`). Build metadata never affects ordering.

use semver::Version;
use std::cmp::Ordering;

/// Parse a version string, filling in missing minor/patch components
pub fn parse_version(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    // Split off "-pre" / "+build" so padding only touches the numeric core
    let core_end = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(core_end);

    let padded = match core.split('.').count() {
        1 => format!("{}.0.0{}", core, suffix),
        2 => format!("{}.0{}", core, suffix),
        _ => trimmed.to_string(),
    };

    Version::parse(&padded).ok()
}

/// Returns true if `version` is a usable semantic version
pub fn validate(version: &str) -> bool {
    parse_version(version).is_some()
}

/// Order two valid versions by semver precedence
///
/// Callers validate first; an unparsable side sorts below any valid one so
/// the ordering stays total.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => precedence(&a, &b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Returns true if `candidate` is strictly newer than `current`
pub fn is_newer(candidate: &str, current: &str) -> bool {
    compare(candidate, current) == Ordering::Greater
}

fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_semver() {
        assert!(validate("1.2.3"));
        assert!(validate("0.0.0"));
        assert!(validate("10.20.30"));
        assert!(validate("1.0.0-beta.1"));
        assert!(validate("1.0.0+build.5"));
    }

    #[test]
    fn test_validate_accepts_short_and_prefixed() {
        assert!(validate("v1.2.3"));
        assert!(validate("1.2"));
        assert!(validate("2"));
        assert!(validate("1.2-rc.1"));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(!validate(""));
        assert!(!validate("abc"));
        assert!(!validate("1.a.3"));
        assert!(!validate("1.2.3.4"));
        assert!(!validate("1..2"));
        assert!(!validate("01.2.3"));
    }

    #[test]
    fn test_compare_basic() {
        assert_eq!(compare("1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare("1.0.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare("2.0.0", "1.99.99"), Ordering::Greater);
    }

    #[test]
    fn test_compare_short_forms_equal_full() {
        assert_eq!(compare("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare("v1.2.0", "1.2.0"), Ordering::Equal);
    }

    #[test]
    fn test_compare_prerelease_below_release() {
        assert_eq!(compare("1.0.0-beta", "1.0.0"), Ordering::Less);
        assert_eq!(compare("1.0.0-alpha", "1.0.0-beta"), Ordering::Less);
        assert_eq!(compare("1.0.0-rc.2", "1.0.0-rc.10"), Ordering::Less);
    }

    #[test]
    fn test_compare_ignores_build_metadata() {
        assert_eq!(compare("1.0.0+a", "1.0.0+b"), Ordering::Equal);
    }

    #[test]
    fn test_compare_is_antisymmetric_and_reflexive() {
        let versions = [
            "0.1.0", "1.0.0-alpha", "1.0.0", "1.1.0", "1.2.0", "1.10.0", "2.0.0-rc.1", "2.0.0",
        ];
        for a in versions {
            assert_eq!(compare(a, a), Ordering::Equal);
            for b in versions {
                assert_eq!(compare(a, b), compare(b, a).reverse(), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_is_newer() {
        assert!(is_newer("1.2.0", "1.1.0"));
        assert!(!is_newer("1.1.0", "1.1.0"));
        assert!(!is_newer("1.0.5", "1.1.0"));
    }
}
