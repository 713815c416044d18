//! Prefixed entity identifiers.
//!
//! Every entity id is a two-letter prefix, an underscore and eight characters
//! from the Crockford base32 alphabet, e.g. `RE_5T2K9QXM`.

use rand::Rng;

/// Crockford base32 alphabet (no I, L, O or U).
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const BODY_LEN: usize = 8;

pub const RELEASE_PREFIX: &str = "RE";
pub const TASK_PREFIX: &str = "TA";
pub const TASK_SERVICE_PREFIX: &str = "TS";
pub const EVENT_PREFIX: &str = "EV";
pub const STUDY_PREFIX: &str = "SD";

/// Generate a new id with the given prefix.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..BODY_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}_{}", prefix, body)
}

pub fn release_id() -> String {
    generate(RELEASE_PREFIX)
}

pub fn task_id() -> String {
    generate(TASK_PREFIX)
}

pub fn task_service_id() -> String {
    generate(TASK_SERVICE_PREFIX)
}

pub fn event_id() -> String {
    generate(EVENT_PREFIX)
}

/// Whether `id` is a well-formed identifier carrying `prefix`.
///
/// Lowercase body characters are accepted since the upstream catalog is not
/// consistent about case.
pub fn is_valid(id: &str, prefix: &str) -> bool {
    let Some(body) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    body.len() == BODY_LEN
        && body
            .bytes()
            .all(|b| ALPHABET.contains(&b.to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid() {
        for _ in 0..100 {
            let id = release_id();
            assert_eq!(id.len(), 11);
            assert!(is_valid(&id, RELEASE_PREFIX), "{id}");
        }
        assert!(task_id().starts_with("TA_"));
        assert!(task_service_id().starts_with("TS_"));
        assert!(event_id().starts_with("EV_"));
    }

    #[test]
    fn test_is_valid_rejects_malformed() {
        assert!(is_valid("SD_ME0WME0W", STUDY_PREFIX));
        assert!(is_valid("SD_me0wme0w", STUDY_PREFIX));
        assert!(!is_valid("SD_ME0WME0", STUDY_PREFIX));
        assert!(!is_valid("SD_ME0WME0WX", STUDY_PREFIX));
        assert!(!is_valid("SDXME0WME0W", STUDY_PREFIX));
        assert!(!is_valid("RE_ME0WME0W", STUDY_PREFIX));
        // I, L, O and U are excluded from the alphabet
        assert!(!is_valid("SD_ILOUILOU", STUDY_PREFIX));
    }
}
