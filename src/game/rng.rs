//! Seeded random streams for terrain, wind, room codes and reconnect tokens

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Room code alphabet without look-alike characters (0/O, 1/I)
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Reconnect tokens are this many random bytes, hex encoded
const TOKEN_BYTES: usize = 16;

/// Deterministic pseudo-random stream. The same seed always yields the same sequence.
#[derive(Debug, Clone)]
pub struct GameRng {
    inner: ChaCha8Rng,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Stream seeded from OS entropy (room seeds, codes)
    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn next_seed(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform value in `[min, max]`
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    pub fn below(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.inner.gen_range(0..max)
    }

    /// Opaque reconnect token (32 hex characters)
    pub fn token(&mut self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.inner.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    pub fn room_code(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| CODE_ALPHABET[self.below(CODE_ALPHABET.len() as u32) as usize] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = GameRng::new(42);
        let mut b = GameRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_seed(), b.next_seed());
        }
        assert_eq!(a.range(-24.0, 24.0), b.range(-24.0, 24.0));
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = GameRng::new(7);
        for _ in 0..1000 {
            let v = rng.range(-24.0, 24.0);
            assert!((-24.0..=24.0).contains(&v));
        }
        assert_eq!(rng.range(3.0, 3.0), 3.0);
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn test_token_shape() {
        let mut rng = GameRng::new(1);
        let token = rng.token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, rng.token());
    }

    #[test]
    fn test_room_code_alphabet() {
        let mut rng = GameRng::new(9);
        let code = rng.room_code(5);
        assert_eq!(code.len(), 5);
        assert!(code.bytes().all(|c| CODE_ALPHABET.contains(&c)));
    }
}
