use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};

const REFERENCE_PREFIX: &str = "PAY";
const RANDOM_LEN: usize = 10;

/// Builds the gateway-visible payment reference: fixed prefix, creation
/// instant in unix milliseconds, random alphanumeric tail. The timestamp
/// keeps references sortable; the tail makes them unguessable.
pub fn generate() -> String {
    let tail: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_LEN)
        .map(char::from)
        .collect();

    format!(
        "{}-{}-{}",
        REFERENCE_PREFIX,
        Utc::now().timestamp_millis(),
        tail
    )
}
