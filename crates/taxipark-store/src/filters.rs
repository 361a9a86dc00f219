/// Escape `LIKE` metacharacters so a filter value is matched literally.
/// Queries using the result must specify `ESCAPE '!'`.
#[must_use]
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '!' | '%' | '_' => {
                out.push('!');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Pattern for a case-insensitive substring match, or `None` when the
/// filter parameter is absent or empty (meaning: unfiltered).
#[must_use]
pub fn contains_pattern(filter: Option<&str>) -> Option<String> {
    let needle = filter?;
    if needle.trim().is_empty() {
        return None;
    }
    Some(format!("%{}%", escape_like(&needle.to_lowercase())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("100%_done!"), "100!%!_done!!");
        assert_eq!(escape_like("BMW"), "BMW");
    }

    #[test]
    fn empty_or_missing_filter_means_unfiltered() {
        assert_eq!(contains_pattern(None), None);
        assert_eq!(contains_pattern(Some("")), None);
        assert_eq!(contains_pattern(Some("   ")), None);
    }

    #[test]
    fn pattern_is_lowercased_substring() {
        assert_eq!(contains_pattern(Some("BM")), Some("%bm%".to_string()));
    }

    #[test]
    fn surrounding_whitespace_is_matched_literally() {
        assert_eq!(contains_pattern(Some(" BM")), Some("% bm%".to_string()));
    }
}
