//! Chronologically ordered keys for pushed documents.
//!
//! A key is 20 characters: 8 encode the millisecond timestamp in a base-64
//! alphabet whose ASCII order matches numeric order, 12 are random. Keys
//! generated in the same millisecond reuse the previous random part plus
//! one, so keys from one generator always sort in creation order.

use chrono::Utc;
use rand::Rng;
use std::sync::Mutex;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

#[derive(Debug, Default)]
struct GeneratorState {
    last_time: i64,
    last_random: [u8; RANDOM_CHARS],
}

/// Thread-safe push key generator.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<GeneratorState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    /// Generates a key for the given wall-clock time. A clock that steps
    /// backwards is treated as the last seen time.
    pub fn next_id_at(&self, now_ms: i64) -> String {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let now = now_ms.max(state.last_time).max(0);
        if now == state.last_time && state.last_time != 0 {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::thread_rng();
            for slot in state.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        }
        state.last_time = now;

        let mut key = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        key.push_str(&encode_time(now));
        key.extend(state.last_random.iter().map(|&i| PUSH_CHARS[i as usize] as char));
        key
    }
}

fn encode_time(mut millis: i64) -> String {
    let mut chars = [b'-'; TIME_CHARS];
    for slot in chars.iter_mut().rev() {
        *slot = PUSH_CHARS[(millis % 64) as usize];
        millis /= 64;
    }
    chars.iter().map(|&b| b as char).collect()
}

/// Base-64 increment with carry, most significant digit first.
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
