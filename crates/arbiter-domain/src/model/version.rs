//! Version matching for policy references.
//!
//! Versions are dot-separated non-negative integers. In a match pattern `*`
//! stands for any single component and a trailing `+` for one or more
//! further components.

use super::IdReference;
use std::cmp::Ordering;

/// Does `version` satisfy the match `pattern`?
pub fn version_matches(pattern: &str, version: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let version: Vec<&str> = version.split('.').collect();

    let mut vi = 0;
    for (pi, component) in pattern.iter().enumerate() {
        match *component {
            "+" => return pi == pattern.len() - 1 && vi < version.len(),
            "*" => {
                if vi >= version.len() {
                    return false;
                }
            }
            literal => {
                if version.get(vi) != Some(&literal) {
                    return false;
                }
            }
        }
        vi += 1;
    }
    vi == version.len()
}

/// Numeric component-wise ordering; missing components count as zero and
/// wildcard components compare equal to anything.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| -> Vec<Option<u64>> {
        s.split('.')
            .map(|c| match c {
                "*" | "+" => None,
                n => Some(n.parse().unwrap_or(0)),
            })
            .collect()
    };
    let (a, b) = (parse(a), parse(b));
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(Some(0));
        let y = b.get(i).copied().unwrap_or(Some(0));
        match (x, y) {
            (Some(x), Some(y)) if x != y => return x.cmp(&y),
            _ => {}
        }
    }
    Ordering::Equal
}

impl IdReference {
    /// Whether a candidate with this `version` satisfies every constraint.
    pub fn accepts(&self, version: &str) -> bool {
        if let Some(pattern) = &self.version
            && !version_matches(pattern, version)
        {
            return false;
        }
        if let Some(earliest) = &self.earliest_version
            && compare_versions(version, earliest) == Ordering::Less
        {
            return false;
        }
        if let Some(latest) = &self.latest_version
            && compare_versions(version, latest) == Ordering::Greater
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_single_component() {
        assert!(version_matches("1.*", "1.4"));
        assert!(!version_matches("1.*", "1.4.2"));
        assert!(!version_matches("1.*", "2.0"));
        assert!(version_matches("1.0", "1.0"));
    }

    #[test]
    fn plus_matches_trailing_components() {
        assert!(version_matches("1.+", "1.4.2"));
        assert!(version_matches("1.+", "1.0"));
        assert!(!version_matches("1.+", "1"));
    }

    #[test]
    fn reference_range_constraints() {
        let mut reference = IdReference::new("p");
        reference.earliest_version = Some("1.2".to_string());
        reference.latest_version = Some("2.0".to_string());
        assert!(reference.accepts("1.2"));
        assert!(reference.accepts("1.10"));
        assert!(!reference.accepts("1.1"));
        assert!(!reference.accepts("2.0.1"));
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("1", "1.0"), Ordering::Equal);
    }
}
