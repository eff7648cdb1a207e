use std::env;
use std::time::Duration;

use crate::domain::dtmf::ToneTiming;
use crate::domain::order::PICKUP_WINDOW_HOURS;
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub tone_timing: ToneTiming,
    pub pickup_window_hours: i64,
    pub pcm_sample_rate: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tone_timing: ToneTiming::default(),
            pickup_window_hours: PICKUP_WINDOW_HOURS,
            pcm_sample_rate: 8000,
        }
    }
}

impl Settings {
    /// Read settings from the process environment (after `.env` has been
    /// loaded by the caller). Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Settings::default();
        let timing = defaults.tone_timing;

        let millis = |key: &str, default: Duration| -> Result<Duration, AppError> {
            Ok(parse_or(&lookup, key, whole_millis(default))?.map_or(default, Duration::from_millis))
        };

        let tone_timing = ToneTiming {
            settle: millis("DCYM_TONE_SETTLE_MS", timing.settle)?,
            tone: millis("DCYM_TONE_MS", timing.tone)?,
            final_tone: millis("DCYM_FINAL_TONE_MS", timing.final_tone)?,
            margin: millis("DCYM_TONE_MARGIN_MS", timing.margin)?,
            digit_gap: millis("DCYM_DIGIT_GAP_MS", timing.digit_gap)?,
        };

        let pickup_window_hours = parse_or(&lookup, "DCYM_PICKUP_WINDOW_HOURS", defaults.pickup_window_hours)?
            .unwrap_or(defaults.pickup_window_hours);
        if pickup_window_hours <= 0 {
            return Err(AppError::Config(
                "DCYM_PICKUP_WINDOW_HOURS must be positive".to_string(),
            ));
        }

        let pcm_sample_rate = parse_or(&lookup, "DCYM_PCM_SAMPLE_RATE", defaults.pcm_sample_rate)?
            .unwrap_or(defaults.pcm_sample_rate);
        if pcm_sample_rate == 0 {
            return Err(AppError::Config("DCYM_PCM_SAMPLE_RATE must be positive".to_string()));
        }

        Ok(Settings {
            tone_timing,
            pickup_window_hours,
            pcm_sample_rate,
        })
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
fn whole_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Parsed value of `key`, `None` when unset. The default only feeds the
/// error message.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            AppError::Config(format!(
                "{} must be a valid number (default {}), got '{}'",
                key, default, raw
            ))
        }),
    }
}
