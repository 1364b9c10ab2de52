//! Helpers shared by catalog backends.

use crate::backends::error::{BackendError, BackendResult};

/// UUID format: 8-4-4-4-12 hexadecimal characters
const MBID_LENGTH: usize = 36;
const MBID_DASH_COUNT: usize = 4;

/// Largest page a caller may request.
pub const MAX_LIMIT: usize = 100;

/// Check if a string looks like a MusicBrainz ID (UUID format).
///
/// Example: 5b11f4ce-a62d-471e-81fc-a69a8278c7da
pub fn is_mbid(query: &str) -> bool {
    query.len() == MBID_LENGTH
        && query.chars().filter(|c| *c == '-').count() == MBID_DASH_COUNT
        && query.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// Reject ids that cannot possibly exist upstream before spending a request.
pub fn require_mbid(id: &str) -> BackendResult<&str> {
    let id = id.trim();
    if is_mbid(id) {
        Ok(id)
    } else {
        Err(BackendError::invalid_input(format!(
            "'{}' is not a MusicBrainz ID (expected UUID)",
            id
        )))
    }
}

/// Format a duration in milliseconds to MM:SS format.
pub fn format_duration(length_ms: u64) -> String {
    let duration_secs = length_ms / 1000;
    let minutes = duration_secs / 60;
    let seconds = duration_secs % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Extract year from a date string.
/// MusicBrainz DateString format can be: "YYYY-MM-DD", "YYYY-MM", or "YYYY"
pub fn extract_year(date_str: &str) -> Option<String> {
    date_str.get(..4).map(str::to_string)
}

/// Get artist name from artist credit.
pub fn get_artist_name(
    artist_credit: &Option<Vec<musicbrainz_rs::entity::artist_credit::ArtistCredit>>,
) -> Option<String> {
    artist_credit
        .as_ref()
        .and_then(|ac| ac.first())
        .map(|a| a.name.clone())
}

/// Clamp a requested limit to 1..=100.
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

/// Map a provider error message onto the adapter taxonomy.
///
/// The MusicBrainz client reports HTTP failures as opaque messages, so the
/// status is recovered from the text.
pub fn classify_upstream(context: &str, message: String) -> BackendError {
    let lower = message.to_lowercase();
    if lower.contains("404") || lower.contains("not found") {
        BackendError::not_found(format!("{}: {}", context, message))
    } else if lower.contains("400") || lower.contains("invalid") {
        BackendError::invalid_input(format!("{}: {}", context, message))
    } else {
        BackendError::unavailable(format!("{}: {}", context, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_mbid_valid() {
        assert!(is_mbid("5b11f4ce-a62d-471e-81fc-a69a8278c7da"));
        assert!(is_mbid("1b022e01-4da6-387b-8658-8678046e4cef"));
    }

    #[test]
    fn test_is_mbid_invalid() {
        assert!(!is_mbid("Nirvana"));
        assert!(!is_mbid("5b11f4ce-a62d-471e-81fc")); // too short
        assert!(!is_mbid("5b11f4ce-a62d-471e-81fc-a69a8278c7da-extra")); // too long
        assert!(!is_mbid("5b11f4ce_a62d_471e_81fc_a69a8278c7da")); // wrong separator
    }

    #[test]
    fn test_require_mbid_trims() {
        assert_eq!(
            require_mbid(" 5b11f4ce-a62d-471e-81fc-a69a8278c7da ").unwrap(),
            "5b11f4ce-a62d-471e-81fc-a69a8278c7da"
        );
        assert!(matches!(
            require_mbid("dQw4w9WgXcQ"),
            Err(BackendError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(180000), "3:00");
        assert_eq!(format_duration(245000), "4:05");
        assert_eq!(format_duration(59000), "0:59");
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(200), 100);
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("1997-06-16"), Some("1997".to_string()));
        assert_eq!(extract_year("1997"), Some("1997".to_string()));
        assert_eq!(extract_year("97"), None);
    }

    #[test]
    fn test_classify_upstream() {
        assert!(matches!(
            classify_upstream("fetch", "HTTP status 404 Not Found".to_string()),
            BackendError::NotFound(_)
        ));
        assert!(matches!(
            classify_upstream("fetch", "connection reset".to_string()),
            BackendError::UpstreamUnavailable(_)
        ));
    }
}
