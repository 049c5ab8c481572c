//! Chronologically ordered child keys in the Firebase push-id format.
//!
//! A push id is 20 characters from a 64-character alphabet sorted in ASCII
//! order: 8 characters encode the creation time in milliseconds, 12 are
//! random. Ids created in the same millisecond reuse the previous random
//! part incremented by one, so keys always sort in creation order.

use std::sync::{LazyLock, Mutex, PoisonError};

use chrono::Utc;
use rand::Rng;

use moon_bling_core::PushKey;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

static GENERATOR: LazyLock<PushIdGenerator> = LazyLock::new(PushIdGenerator::default);

/// Generate a new push key using the current time.
#[must_use]
pub fn generate_push_key() -> PushKey {
    GENERATOR.generate(Utc::now().timestamp_millis())
}

#[derive(Default)]
struct PushIdGenerator {
    state: Mutex<GeneratorState>,
}

#[derive(Default)]
struct GeneratorState {
    last_millis: i64,
    last_random: [u8; RANDOM_CHARS],
}

impl PushIdGenerator {
    fn generate(&self, now_millis: i64) -> PushKey {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if now_millis == state.last_millis {
            increment(&mut state.last_random);
        } else {
            state.last_millis = now_millis;
            let mut rng = rand::rng();
            for digit in &mut state.last_random {
                *digit = rng.random_range(0..64);
            }
        }

        let mut id = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        let mut time_digits = [0_u8; TIME_CHARS];
        let mut remaining = u64::try_from(now_millis).unwrap_or(0);
        for digit in time_digits.iter_mut().rev() {
            *digit = u8::try_from(remaining % 64).unwrap_or(0);
            remaining /= 64;
        }
        id.extend(time_digits.iter().map(|&d| push_char(d)));
        id.extend(state.last_random.iter().map(|&d| push_char(d)));

        PushKey::parse(&id).unwrap_or_else(|_| unreachable!("push alphabet is key-safe"))
    }
}

/// Add one to a base-64 number stored most significant digit first.
fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

fn push_char(digit: u8) -> char {
    PUSH_CHARS
        .get(usize::from(digit))
        .map_or('-', |&b| char::from(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_key_shape() {
        let key = generate_push_key();
        assert_eq!(key.as_str().len(), TIME_CHARS + RANDOM_CHARS);
        assert!(key.as_str().bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_keys_sort_in_creation_order_within_one_millisecond() {
        let generator = PushIdGenerator::default();
        let keys: Vec<PushKey> = (0..200).map(|_| generator.generate(1_700_000_000_000)).collect();
        assert!(keys.windows(2).all(|pair| pair.first() < pair.last()));
    }

    #[test]
    fn test_keys_sort_by_time() {
        let generator = PushIdGenerator::default();
        let earlier = generator.generate(1_700_000_000_000);
        let later = generator.generate(1_700_000_000_001);
        assert!(earlier < later);
    }

    #[test]
    fn test_time_prefix_encoding() {
        let generator = PushIdGenerator::default();
        let key = generator.generate(0);
        assert!(key.as_str().starts_with("--------"));

        let key = generator.generate(64);
        assert!(key.as_str().starts_with("------0-"));
    }

    #[test]
    fn test_increment_carries() {
        let mut digits = [63; RANDOM_CHARS];
        if let Some(first) = digits.first_mut() {
            *first = 5;
        }
        increment(&mut digits);
        assert_eq!(digits.first(), Some(&6));
        assert!(digits.iter().skip(1).all(|&d| d == 0));
    }
}
