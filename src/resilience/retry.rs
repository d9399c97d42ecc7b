use std::time::Duration;

use crate::config::settings::RetryConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySettings {
    /// failed cycles tolerated in a row before the delay stops growing
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { attempts: 5, base_delay_ms: 1000, max_delay_ms: 30_000 }
    }
}

impl RetrySettings {
    pub fn from_config(retry: &Option<RetryConfig>) -> Self {
        let defaults = Self::default();
        Self {
            attempts: retry.as_ref().and_then(|r| r.attempts).unwrap_or(defaults.attempts),
            base_delay_ms: retry.as_ref().and_then(|r| r.base_delay_ms).unwrap_or(defaults.base_delay_ms),
            max_delay_ms: retry.as_ref().and_then(|r| r.max_delay_ms).unwrap_or(defaults.max_delay_ms),
        }
    }

    /// Delay before retrying after the `failures`-th consecutive failure (1-based).
    ///
    /// Doubles from `base_delay_ms` and is capped at `max_delay_ms`; past
    /// `attempts` failures it stays at the cap.
    pub fn delay_after(&self, failures: u32) -> Duration {
        if failures > self.attempts {
            return Duration::from_millis(self.max_delay_ms);
        }
        let exponent = failures.saturating_sub(1).min(32);
        let delay = self.base_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_up_to_cap() {
        let retry = RetrySettings { attempts: 10, base_delay_ms: 200, max_delay_ms: 1000 };
        assert_eq!(retry.delay_after(1), Duration::from_millis(200));
        assert_eq!(retry.delay_after(2), Duration::from_millis(400));
        assert_eq!(retry.delay_after(3), Duration::from_millis(800));
        assert_eq!(retry.delay_after(4), Duration::from_millis(1000));
        assert_eq!(retry.delay_after(60), Duration::from_millis(1000));
    }

    #[test]
    fn delay_past_attempts_is_the_cap() {
        let retry = RetrySettings { attempts: 2, base_delay_ms: 100, max_delay_ms: 5000 };
        assert_eq!(retry.delay_after(2), Duration::from_millis(200));
        assert_eq!(retry.delay_after(3), Duration::from_millis(5000));
    }

    #[test]
    fn from_config_fills_missing_values() {
        let cfg = Some(RetryConfig { attempts: Some(3), base_delay_ms: None, max_delay_ms: Some(2000) });
        let retry = RetrySettings::from_config(&cfg);
        assert_eq!(retry, RetrySettings { attempts: 3, base_delay_ms: 1000, max_delay_ms: 2000 });
        assert_eq!(RetrySettings::from_config(&None), RetrySettings::default());
    }
}
