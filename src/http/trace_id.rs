//! Correlation id generation.
//!
//! Ids are decimal renderings of random `u64`s. Uniqueness is probabilistic:
//! a collision merges two request groups, nothing worse.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Random source owned by a `LogService`, seeded once from the wall clock.
#[derive(Debug)]
pub struct TraceIdGenerator {
    rng: Mutex<StdRng>,
}

impl TraceIdGenerator {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::with_seed(nanos)
    }

    /// Deterministic generator, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn generate(&self) -> String {
        let value: u64 = self.rng.lock().unwrap_or_else(PoisonError::into_inner).gen();
        value.to_string()
    }
}

impl Default for TraceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_decimal_format() {
        let id = TraceIdGenerator::new().generate();
        assert!(!id.is_empty());
        assert!(id.parse::<u64>().is_ok(), "{id} is not a decimal u64");
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let a = TraceIdGenerator::with_seed(7);
        let b = TraceIdGenerator::with_seed(7);
        assert_eq!(a.generate(), b.generate());
    }

    #[test]
    fn test_unique_across_threads() {
        let generator = Arc::new(TraceIdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    (0..1000).map(|_| generator.generate()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate trace id");
            }
        }
        assert_eq!(seen.len(), 8000);
    }
}
