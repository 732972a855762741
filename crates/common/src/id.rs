//! ID generation utilities.

use rand::Rng;
use ulid::Ulid;
use uuid::Uuid;

/// Alphabet for short share codes. Excludes `0/O/1/I/L` to keep codes
/// unambiguous when read aloud or transcribed.
const SHORT_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of generated short share codes.
pub const SHORT_CODE_LEN: usize = 8;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a short human-shareable code for a report.
    ///
    /// Uniqueness is probabilistic; callers must check the store and retry
    /// on collision before assigning the code to a record.
    #[must_use]
    pub fn generate_short_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..SHORT_CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..SHORT_CODE_ALPHABET.len());
                SHORT_CODE_ALPHABET[idx] as char
            })
            .collect()
    }

    /// Generate a cryptographically secure random token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Use UUID v4 for tokens (no time component for security)
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_short_code() {
        let id_gen = IdGenerator::new();
        let code = id_gen.generate_short_code();

        assert_eq!(code.len(), SHORT_CODE_LEN);
        assert!(code.bytes().all(|b| SHORT_CODE_ALPHABET.contains(&b)));
        // No ambiguous characters
        assert!(!code.contains('0'));
        assert!(!code.contains('O'));
        assert!(!code.contains('1'));
        assert!(!code.contains('I'));
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 32); // Simple UUID without hyphens
    }
}
