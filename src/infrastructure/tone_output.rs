use std::f32::consts::PI;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::dtmf::DtmfTone;
use crate::domain::errors::PlaybackError;
use crate::domain::ports::ToneOutput;

/// Tone output that only logs, for hosts without an audio device.
#[derive(Debug, Default)]
pub struct LoggingToneOutput;

impl ToneOutput for LoggingToneOutput {
    fn start_tone(&self, tone: DtmfTone, duration: Duration) -> Result<(), PlaybackError> {
        let (low, high) = tone.frequencies();
        log::info!(
            "DTMF '{}' ({} Hz + {} Hz) for {} ms",
            tone,
            low,
            high,
            duration.as_millis()
        );
        Ok(())
    }

    fn stop(&self) {
        log::info!("DTMF output stopped");
    }
}

/// Synthesises signed 16-bit mono PCM for every tone it is asked to play.
#[derive(Debug, Clone)]
pub struct PcmToneOutput {
    sample_rate: u32,
    samples: Arc<Mutex<Vec<i16>>>,
}

const AMPLITUDE: f32 = 0.45 * i16::MAX as f32;

impl PcmToneOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Copy of everything rendered so far.
    pub fn samples(&self) -> Vec<i16> {
        self.samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Render `tone` for `duration` as the sum of its row and column sines.
    pub fn render(&self, tone: DtmfTone, duration: Duration) -> Vec<i16> {
        let (low, high) = tone.frequencies();
        let count = (duration.as_secs_f64() * f64::from(self.sample_rate)).round() as usize;
        let rate = self.sample_rate as f32;
        (0..count)
            .map(|n| {
                let t = n as f32 / rate;
                let v = 0.5 * ((2.0 * PI * low * t).sin() + (2.0 * PI * high * t).sin());
                (v * AMPLITUDE) as i16
            })
            .collect()
    }
}

impl ToneOutput for PcmToneOutput {
    fn start_tone(&self, tone: DtmfTone, duration: Duration) -> Result<(), PlaybackError> {
        if self.sample_rate == 0 {
            return Err(PlaybackError::Output("sample rate must be positive".to_string()));
        }
        let rendered = self.render(tone, duration);
        let mut samples = self
            .samples
            .lock()
            .map_err(|e| PlaybackError::Output(e.to_string()))?;
        samples.extend(rendered);
        log::debug!("rendered DTMF '{}' into {} samples", tone, samples.len());
        Ok(())
    }

    fn stop(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Goertzel power of `freq` in `samples`.
    fn power(samples: &[i16], rate: u32, freq: f32) -> f32 {
        let k = 2.0 * (2.0 * PI * freq / rate as f32).cos();
        let (mut s1, mut s2) = (0.0f32, 0.0f32);
        for &x in samples {
            let s0 = x as f32 + k * s1 - s2;
            s2 = s1;
            s1 = s0;
        }
        s1 * s1 + s2 * s2 - k * s1 * s2
    }

    #[test]
    fn sample_count_matches_duration() {
        let out = PcmToneOutput::new(8000);
        out.start_tone(DtmfTone::D5, Duration::from_millis(600)).unwrap();
        out.start_tone(DtmfTone::D6, Duration::from_millis(1050)).unwrap();
        assert_eq!(out.samples().len(), 4800 + 8400);
    }

    #[test]
    fn rendered_tone_contains_its_frequencies() {
        let out = PcmToneOutput::new(8000);
        let samples = out.render(DtmfTone::D1, Duration::from_millis(100));
        let row = power(&samples, 8000, 697.0);
        let col = power(&samples, 8000, 1209.0);
        let other = power(&samples, 8000, 941.0);
        assert!(row > other * 10.0);
        assert!(col > other * 10.0);
    }

    #[test]
    fn zero_sample_rate_is_an_output_error() {
        let out = PcmToneOutput::new(0);
        assert!(matches!(
            out.start_tone(DtmfTone::D0, Duration::from_millis(10)),
            Err(PlaybackError::Output(_))
        ));
    }

    #[test]
    fn logging_output_accepts_every_tone() {
        let out = LoggingToneOutput;
        for c in "0123456789*#".chars() {
            let tone = DtmfTone::from_char(c).unwrap();
            assert!(out.start_tone(tone, Duration::from_millis(1)).is_ok());
        }
    }
}
