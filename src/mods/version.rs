use std::cmp::Ordering;

/// Normalize version string by removing 'v' prefix and surrounding whitespace.
pub fn normalize_version(version: &str) -> String {
    version.trim().trim_start_matches('v').to_owned()
}

/// Compare two dotted versions component by component; missing components count as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parts_a = parse_version_parts(a);
    let parts_b = parse_version_parts(b);

    let max_len = parts_a.len().max(parts_b.len());
    for i in 0..max_len {
        let a_part = parts_a.get(i).copied().unwrap_or(0);
        let b_part = parts_b.get(i).copied().unwrap_or(0);
        match a_part.cmp(&b_part) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

/// Parse version string into parts (e.g., "0.1.5" -> [0, 1, 5]).
fn parse_version_parts(version: &str) -> Vec<u32> {
    normalize_version(version)
        .split('.')
        .filter_map(|part| part.parse::<u32>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_version_strings() {
        assert_eq!(normalize_version("v0.1.5"), "0.1.5");
        assert_eq!(normalize_version("  1.2.3\n"), "1.2.3");
    }

    #[test]
    fn parses_version_parts_correctly() {
        assert_eq!(parse_version_parts("0.1.5"), vec![0, 1, 5]);
        assert_eq!(parse_version_parts("10.0"), vec![10, 0]);
        assert_eq!(parse_version_parts("invalid"), Vec::<u32>::new());
    }

    #[test]
    fn compares_versions_correctly() {
        assert_eq!(compare_versions("0.9.9", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("0.0.0", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
    }
}
