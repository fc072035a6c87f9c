//! Identifier generation.
//!
//! Session IDs are drawn at random from `[1, 2^32)`. Request IDs are
//! session-scoped and sequential, wrapping back to 1 after 2^53.

use rand::{CryptoRng, Rng, RngCore};

use crate::messages::MAX_ID;

/// Exclusive upper bound for generated session IDs
pub const SESSION_ID_MAX: u64 = 1 << 32;

/// Random session ID in `[1, 2^32)`
pub fn generate_session_id() -> u64 {
    generate_session_id_with_rng(&mut rand::thread_rng())
}

/// [`generate_session_id`] with an injected random source.
pub fn generate_session_id_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> u64 {
    rng.gen_range(1..SESSION_ID_MAX)
}

/// Sequential request IDs for one session
#[derive(Debug, Clone, Default)]
pub struct SessionScopeIdGenerator {
    id: u64,
}

impl SessionScopeIdGenerator {
    /// Generator whose first ID is 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Next request ID
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        if self.id == MAX_ID {
            self.id = 0;
        }
        self.id += 1;
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_session_id_range() {
        let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(1);
        for _ in 0..1000 {
            let id = generate_session_id_with_rng(&mut rng);
            assert!((1..SESSION_ID_MAX).contains(&id));
        }
        assert!(generate_session_id() >= 1);
    }

    #[test]
    fn test_scope_ids_are_sequential() {
        let mut ids = SessionScopeIdGenerator::new();
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);
        assert_eq!(ids.next(), 3);
    }

    #[test]
    fn test_scope_ids_wrap() {
        let mut ids = SessionScopeIdGenerator { id: MAX_ID - 1 };
        assert_eq!(ids.next(), MAX_ID);
        assert_eq!(ids.next(), 1);
    }
}
