//! Input validation and normalization rules.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Reject empty or whitespace-only titles.
///
/// Applies to create and to updates that supply a title; the stored title is
/// kept verbatim, only the emptiness check trims.
pub fn check_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("title required"));
    }
    Ok(())
}

/// Normalize a tag set: trim whitespace, drop empties, and dedup keeping the
/// first occurrence. No case folding.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if seen.insert(tag.to_string()) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_titles_rejected() {
        assert!(check_title("").is_err());
        assert!(check_title("   ").is_err());
        assert!(check_title("\t\n").is_err());
        assert!(check_title("deploy").is_ok());
        assert!(check_title("  deploy  ").is_ok());
    }

    #[test]
    fn test_tags_trimmed_and_empties_dropped() {
        let tags = vec![
            "  infra ".to_string(),
            "".to_string(),
            "   ".to_string(),
            "backend".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["infra", "backend"]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let tags = vec![
            "infra".to_string(),
            "backend".to_string(),
            " infra".to_string(),
            "infra ".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["infra", "backend"]);
    }

    #[test]
    fn test_no_case_folding() {
        let tags = vec!["Infra".to_string(), "infra".to_string()];
        assert_eq!(normalize_tags(&tags), vec!["Infra", "infra"]);
    }
}
