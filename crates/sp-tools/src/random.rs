// random.rs — The RandomSource capability.
//
// Correlation IDs and other generated identifiers come through this
// trait so tests can pin them. Entity IDs keep plain UUID v4 at the
// construction sites; this capability covers the identifiers callers
// mint on the request path.

use rand::Rng;
use uuid::Uuid;

/// Identifier generation, injectable for tests.
pub trait RandomSource: Send + Sync {
    fn uuid(&self) -> Uuid;

    /// A lowercase hex string of `len` characters.
    fn hex(&self, len: usize) -> String;
}

/// OS-entropy implementation used in production.
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn uuid(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn hex(&self, len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_are_unique() {
        let random = SystemRandom;
        assert_ne!(random.uuid(), random.uuid());
    }

    #[test]
    fn hex_has_requested_length_and_charset() {
        let random = SystemRandom;
        let hex = random.hex(12);
        assert_eq!(hex.len(), 12);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }
}
