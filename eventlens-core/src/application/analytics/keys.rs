//! Cache key construction for aggregate queries

use crate::domain::auth::TokenHash;

/// Key of the summary for `credential`, optionally filtered by event name.
///
/// The unfiltered sentinel `all` and filtered keys live under different
/// segments, so no event name can collide with the sentinel.
pub fn summary_cache_key(credential: &TokenHash, event_name: Option<&str>) -> String {
    match event_name {
        None => format!("event-summary:{}:all", credential),
        Some(name) => format!("event-summary:{}:event:{}", credential, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_deterministic_and_distinct() {
        let hash = TokenHash::from("abc".to_string());
        assert_eq!(summary_cache_key(&hash, None), "event-summary:abc:all");
        assert_eq!(
            summary_cache_key(&hash, Some("login_click")),
            "event-summary:abc:event:login_click"
        );
        assert_ne!(summary_cache_key(&hash, None), summary_cache_key(&hash, Some("all")));
    }
}
