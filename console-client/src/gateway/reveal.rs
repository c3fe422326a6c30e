//! Character-by-character reveal of an already complete reply.
//!
//! This is presentation pacing only: the text is fully known before the first
//! character is shown, and the final prefix always equals the input.

use std::time::Duration;

use rand::Rng;

use crate::config::TypingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingReveal {
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for TypingReveal {
    fn default() -> Self {
        Self::new(Duration::from_millis(15), Duration::from_millis(35))
    }
}

impl TypingReveal {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// No pause between characters.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &TypingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    fn next_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        rand::thread_rng().gen_range(self.min_delay..self.max_delay)
    }

    /// Call `on_update` with each growing prefix of `text`, one character at a time.
    pub async fn reveal(&self, text: &str, on_update: &mut (dyn FnMut(&str) + Send)) {
        let mut shown = String::with_capacity(text.len());

        for ch in text.chars() {
            let delay = self.next_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            shown.push(ch);
            on_update(&shown);
        }
    }
}
