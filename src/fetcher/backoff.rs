use rand::Rng;
use std::time::Duration;

/// Calculate exponential backoff delay with jitter.
///
/// `attempt` is the 1-based attempt that just failed, so the first retry
/// waits roughly `base`, the second roughly `2 * base`, and so on.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    // Cap the exponent to prevent overflow
    let exponent = attempt.saturating_sub(1).min(10);

    let scaled = base.saturating_mul(2_u32.saturating_pow(exponent));

    // Add jitter: ±30% randomness
    let jitter_factor = rand::thread_rng().gen_range(0.7..1.3);
    scaled.mul_f64(jitter_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let base = Duration::from_millis(500);

        let delay1 = backoff_delay(1, base);
        let delay2 = backoff_delay(2, base);
        let delay3 = backoff_delay(3, base);

        // Delays should be in expected ranges with jitter
        assert!(delay1.as_millis() >= 350 && delay1.as_millis() <= 650); // 500ms ±30%
        assert!(delay2.as_millis() >= 700 && delay2.as_millis() <= 1300); // 1s ±30%
        assert!(delay3.as_millis() >= 1400 && delay3.as_millis() <= 2600); // 2s ±30%
    }

    #[test]
    fn test_backoff_cap() {
        let base = Duration::from_millis(500);

        // Very high attempt numbers are capped at exponent 10
        let delay_high = backoff_delay(40, base);
        let delay_capped = backoff_delay(11, base);

        // 500ms * 2^10 = 512s, with jitter 0.7-1.3 = ~358s-666s
        assert!(delay_high.as_secs() >= 358 && delay_high.as_secs() <= 666);
        assert!(delay_capped.as_secs() >= 358 && delay_capped.as_secs() <= 666);
    }

    #[test]
    fn test_zero_attempt_treated_as_first() {
        let delay = backoff_delay(0, Duration::from_millis(500));
        assert!(delay.as_millis() >= 350 && delay.as_millis() <= 650);
    }
}
