//! Voter identifier masking.
//!
//! The chain only ever sees the masked form. Masking is deterministic and
//! lossy: it keeps at most four characters of the cleaned identifier.

/// Literal used for identifiers too short to partially reveal.
pub const SHORT_ID_MASK: &str = "****";

/// Mask a raw voter identifier.
///
/// Non-alphanumeric characters are stripped first. A cleaned identifier of
/// four characters or fewer becomes `****`; longer ones keep their first two
/// and last two characters around `***`. An empty input yields an empty
/// string.
pub fn mask_voter_id(voter_id: &str) -> String {
    if voter_id.is_empty() {
        return String::new();
    }

    let clean: Vec<char> = voter_id.chars().filter(char::is_ascii_alphanumeric).collect();
    if clean.len() <= 4 {
        return SHORT_ID_MASK.to_string();
    }

    let head: String = clean[..2].iter().collect();
    let tail: String = clean[clean.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_ids_fully_masked() {
        assert_eq!(mask_voter_id("AB"), "****");
        assert_eq!(mask_voter_id("AB12"), "****");
        assert_eq!(mask_voter_id("A-B-1-2"), "****");
    }

    #[test]
    fn test_long_id_partially_masked() {
        assert_eq!(mask_voter_id("voter12345"), "vo***45");
        assert_eq!(mask_voter_id("vo-ter 123.45"), "vo***45");
        assert_eq!(mask_voter_id("ABCDE"), "AB***DE");
    }

    #[test]
    fn test_non_ascii_is_stripped() {
        assert_eq!(mask_voter_id("é-voter99"), "vo***99");
    }

    #[test]
    fn test_empty_id() {
        assert_eq!(mask_voter_id(""), "");
        assert_eq!(mask_voter_id("---"), "****");
    }
}
