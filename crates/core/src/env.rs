//! Environment overrides for runtime knobs.
//!
//! All tunables (`MOODTRACK_TTL_SECS`, `MOODTRACK_POLL_TIMEOUT_SECS`, ...)
//! follow the same contract: unset means the compiled-in default, a value
//! that does not parse logs a warning and falls back to the default rather
//! than failing startup.

use std::time::Duration;

/// Parse an environment variable with a default fallback.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(var, value = %v, default = %default, "invalid env override, using default");
                default
            },
        },
        Err(_) => default,
    }
}

/// Like [`env_parse_with_default`] but for second-granularity durations.
pub fn env_duration_secs(var: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_parse_with_default(var, default_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_when_it_parses() {
        let var = "MOODTRACK_TEST_TTL_41291";
        unsafe { std::env::set_var(var, "42") };
        assert_eq!(env_duration_secs(var, 300), Duration::from_secs(42));
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let var = "MOODTRACK_TEST_TTL_41292";
        unsafe { std::env::set_var(var, "five minutes") };
        assert_eq!(env_parse_with_default(var, 300_u64), 300);
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn unset_falls_back_to_default() {
        let var = "MOODTRACK_TEST_TTL_41293";
        unsafe { std::env::remove_var(var) };
        assert_eq!(env_parse_with_default(var, 7_u64), 7);
    }
}
