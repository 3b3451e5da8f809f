//! Typing Delay
//!
//! How long a bot takes to read what it answers and type its reply, and the
//! helper that queues the finished draft for delivery.

use rand::Rng;

use chat_events::{MessageDraft, SimTime};

use crate::config::TypingConfig;
use crate::timers::{Task, TimerQueue};

/// `base + (len_out·(speed + offset) + len_in/divisor) · uniform(jitter)`, in milliseconds.
pub fn typing_delay_ms<R: Rng + ?Sized>(
    len_out: usize,
    len_in: usize,
    typing_speed: f32,
    config: &TypingConfig,
    rng: &mut R,
) -> u64 {
    let jitter = if config.jitter_max_ms > config.jitter_min_ms {
        rng.gen_range(config.jitter_min_ms..config.jitter_max_ms)
    } else {
        config.jitter_min_ms
    };
    let characters =
        len_out as f32 * (typing_speed + config.typing_offset) + len_in as f32 / config.reading_divisor;
    config.base_ms + (characters * jitter).max(0.0).round() as u64
}

/// Queues a draft to be posted after `delay_ms`. Returns the due time.
pub fn schedule_delivery(
    timers: &mut TimerQueue,
    now: SimTime,
    delay_ms: u64,
    draft: MessageDraft,
    release_speaker: bool,
) -> SimTime {
    let due = now.after(delay_ms);
    tracing::debug!(
        "{} starts typing a {} for {}",
        draft.from.name,
        draft.kind,
        due
    );
    timers.schedule(
        due,
        Task::Deliver {
            draft,
            release_speaker,
        },
    );
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_delay_bounds() {
        let mut rng = SmallRng::seed_from_u64(42);
        let config = TypingConfig::default();
        for _ in 0..1000 {
            let delay = typing_delay_ms(40, 20, 0.5, &config, &mut rng);
            // 40 * 1.0 + 20 / 4 = 45 characters' worth
            let low = config.base_ms + (45.0 * config.jitter_min_ms) as u64;
            let high = config.base_ms + (45.0 * config.jitter_max_ms) as u64;
            assert!(delay >= low && delay <= high, "delay {}", delay);
        }
    }

    #[test]
    fn test_fixed_jitter_is_exact() {
        let mut rng = SmallRng::seed_from_u64(1);
        let config = TypingConfig {
            base_ms: 100,
            typing_offset: 0.0,
            reading_divisor: 2.0,
            jitter_min_ms: 10.0,
            jitter_max_ms: 10.0,
        };
        assert_eq!(typing_delay_ms(10, 10, 1.0, &config, &mut rng), 100 + 150);
        assert_eq!(typing_delay_ms(0, 0, 0.9, &config, &mut rng), 100);
    }

    #[test]
    fn test_slower_typists_take_longer() {
        let config = TypingConfig {
            jitter_min_ms: 50.0,
            jitter_max_ms: 50.0,
            ..TypingConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let fast = typing_delay_ms(30, 0, 0.1, &config, &mut rng);
        let slow = typing_delay_ms(30, 0, 0.9, &config, &mut rng);
        assert!(slow > fast);
    }
}
