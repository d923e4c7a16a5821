//! Backup file naming. The only place that formats or parses
//! `<original-name>.<epoch-ms>.bak`.

const SUFFIX: &str = ".bak";

/// `Map001.json` + `1700000000000` → `Map001.json.1700000000000.bak`
pub fn backup_name(original: &str, timestamp_ms: u64) -> String {
    format!("{original}.{timestamp_ms}{SUFFIX}")
}

/// Timestamp of `candidate` if it is a backup of exactly `original`.
///
/// Anything that does not match the pattern byte for byte (extra dots,
/// signs, empty timestamps, another file's prefix) returns `None`.
pub fn parse_backup_name(original: &str, candidate: &str) -> Option<u64> {
    let digits = candidate
        .strip_prefix(original)?
        .strip_prefix('.')?
        .strip_suffix(SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_and_parses() {
        let name = backup_name("Map001.json", 1_700_000_000_000);
        assert_eq!(name, "Map001.json.1700000000000.bak");
        assert_eq!(
            parse_backup_name("Map001.json", &name),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn rejects_near_misses() {
        assert_eq!(parse_backup_name("Map001.json", "Map001.json.bak"), None);
        assert_eq!(parse_backup_name("Map001.json", "Map001.json..bak"), None);
        assert_eq!(parse_backup_name("Map001.json", "Map001.json.12a.bak"), None);
        assert_eq!(parse_backup_name("Map001.json", "Map001.json.-5.bak"), None);
        assert_eq!(parse_backup_name("Map001.json", "Map001.json.5.bak.tmp"), None);
        // A different file that shares a prefix
        assert_eq!(parse_backup_name("Map001.json", "Map001.json2.5.bak"), None);
        assert_eq!(parse_backup_name("Map00.json", "Map001.json.5.bak"), None);
    }
}
