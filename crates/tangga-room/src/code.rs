//! Room code generation.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tangga_protocol::RoomCode;

/// Produces candidate room codes.
///
/// The registry retries on collision, so an implementation only has to
/// produce well-formed codes, not unique ones.
pub trait CodeGenerator: Send + 'static {
    /// Returns the next candidate code.
    fn next_code(&mut self) -> RoomCode;
}

/// Random codes drawn from [`RoomCode::ALPHABET`].
pub struct RandomCodes {
    rng: StdRng,
    length: usize,
}

impl RandomCodes {
    /// Creates a generator seeded from the operating system.
    pub fn new(length: usize) -> Self {
        Self::from_rng(StdRng::from_os_rng(), length)
    }

    /// Creates a generator with an explicit RNG (deterministic in tests).
    pub fn from_rng(rng: StdRng, length: usize) -> Self {
        Self {
            rng,
            length: length.max(1),
        }
    }
}

impl CodeGenerator for RandomCodes {
    fn next_code(&mut self) -> RoomCode {
        let alphabet = RoomCode::ALPHABET;
        let raw: String = (0..self.length)
            .map(|_| alphabet[self.rng.random_range(0..alphabet.len())] as char)
            .collect();
        RoomCode::new(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_codes_have_requested_length_and_alphabet() {
        let mut codes = RandomCodes::from_rng(StdRng::seed_from_u64(3), 6);
        for _ in 0..200 {
            let code = codes.next_code();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().bytes().all(|b| RoomCode::ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_random_codes_zero_length_is_bumped_to_one() {
        let mut codes = RandomCodes::from_rng(StdRng::seed_from_u64(3), 0);
        assert_eq!(codes.next_code().as_str().len(), 1);
    }
}
