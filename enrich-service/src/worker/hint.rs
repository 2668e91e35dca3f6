//! Contact hint matching

use crate::models::{ContactHint, Profile};
use std::collections::HashMap;

/// Whether every populated hint field agrees with the profile
///
/// Scalars compare case-insensitively. Lists compare as multisets, ignoring
/// order and case. A hint with nothing populated matches.
pub fn hint_matches_profile(hint: &ContactHint, profile: &Profile) -> bool {
    let scalars = [
        (&hint.linkedin_url, &profile.linkedin_url),
        (&hint.twitter_handle, &profile.twitter_handle),
        (&hint.github_username, &profile.github_username),
        (&hint.bio, &profile.bio),
        (&hint.location, &profile.location),
    ];

    let scalars_match = scalars.iter().all(|(given, known)| match given {
        Some(given) if !given.is_empty() => given.to_lowercase() == known.to_lowercase(),
        _ => true,
    });

    scalars_match
        && (hint.skills.is_empty() || same_items(&hint.skills, &profile.skills))
        && (hint.companies.is_empty() || same_items(&hint.companies, &profile.companies))
}

fn same_items(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut counts: HashMap<String, i64> = HashMap::new();
    for item in a {
        *counts.entry(item.to_lowercase()).or_default() += 1;
    }
    for item in b {
        *counts.entry(item.to_lowercase()).or_default() -= 1;
    }
    counts.values().all(|&n| n == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            full_name: "John Doe".to_string(),
            linkedin_url: "https://linkedin.com/in/johndoe".to_string(),
            twitter_handle: "@johndoe_dev".to_string(),
            github_username: "johndoe".to_string(),
            bio: String::new(),
            location: "San Francisco, CA".to_string(),
            skills: vec!["Go".to_string(), "Python".to_string()],
            companies: vec!["Acme Corp".to_string()],
        }
    }

    #[test]
    fn test_populated_fields_must_match() {
        let hint = ContactHint {
            github_username: Some("JohnDoe".to_string()),
            location: Some("san francisco, ca".to_string()),
            ..ContactHint::default()
        };
        assert!(hint_matches_profile(&hint, &profile()));

        let wrong = ContactHint {
            github_username: Some("janedoe".to_string()),
            ..ContactHint::default()
        };
        assert!(!hint_matches_profile(&wrong, &profile()));
    }

    #[test]
    fn test_lists_ignore_order_and_case() {
        let hint = ContactHint {
            skills: vec!["python".to_string(), "GO".to_string()],
            ..ContactHint::default()
        };
        assert!(hint_matches_profile(&hint, &profile()));

        let subset = ContactHint {
            skills: vec!["Go".to_string()],
            ..ContactHint::default()
        };
        assert!(!hint_matches_profile(&subset, &profile()));
    }

    #[test]
    fn test_duplicates_count() {
        let hint = ContactHint {
            skills: vec!["Go".to_string(), "Go".to_string()],
            ..ContactHint::default()
        };
        assert!(!hint_matches_profile(&hint, &profile()));
    }

    #[test]
    fn test_empty_hint_matches() {
        assert!(hint_matches_profile(&ContactHint::default(), &profile()));
    }

    #[test]
    fn test_field_missing_from_profile_does_not_match() {
        let hint = ContactHint {
            bio: Some("Engineer".to_string()),
            ..ContactHint::default()
        };
        assert!(!hint_matches_profile(&hint, &profile()));
    }
}
