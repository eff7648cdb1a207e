use std::fmt;
use std::time::Duration;

/// Standard DTMF keypad tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DtmfTone {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
    D9,
    Star,
    Pound,
}

const ROW_HZ: [f32; 4] = [697.0, 770.0, 852.0, 941.0];
const COL_HZ: [f32; 3] = [1209.0, 1336.0, 1477.0];

impl DtmfTone {
    /// Maps a keypad character to its tone. Anything else is `None`.
    pub fn from_char(c: char) -> Option<DtmfTone> {
        let tone = match c {
            '0' => DtmfTone::D0,
            '1' => DtmfTone::D1,
            '2' => DtmfTone::D2,
            '3' => DtmfTone::D3,
            '4' => DtmfTone::D4,
            '5' => DtmfTone::D5,
            '6' => DtmfTone::D6,
            '7' => DtmfTone::D7,
            '8' => DtmfTone::D8,
            '9' => DtmfTone::D9,
            '*' => DtmfTone::Star,
            '#' => DtmfTone::Pound,
            _ => return None,
        };
        Some(tone)
    }

    pub fn as_char(&self) -> char {
        match self {
            DtmfTone::D0 => '0',
            DtmfTone::D1 => '1',
            DtmfTone::D2 => '2',
            DtmfTone::D3 => '3',
            DtmfTone::D4 => '4',
            DtmfTone::D5 => '5',
            DtmfTone::D6 => '6',
            DtmfTone::D7 => '7',
            DtmfTone::D8 => '8',
            DtmfTone::D9 => '9',
            DtmfTone::Star => '*',
            DtmfTone::Pound => '#',
        }
    }

    /// (row, column) frequencies in Hz.
    pub fn frequencies(&self) -> (f32, f32) {
        let (row, col) = match self {
            DtmfTone::D1 => (0, 0),
            DtmfTone::D2 => (0, 1),
            DtmfTone::D3 => (0, 2),
            DtmfTone::D4 => (1, 0),
            DtmfTone::D5 => (1, 1),
            DtmfTone::D6 => (1, 2),
            DtmfTone::D7 => (2, 0),
            DtmfTone::D8 => (2, 1),
            DtmfTone::D9 => (2, 2),
            DtmfTone::Star => (3, 0),
            DtmfTone::D0 => (3, 1),
            DtmfTone::Pound => (3, 2),
        };
        (ROW_HZ[row], COL_HZ[col])
    }
}

impl fmt::Display for DtmfTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Tone sequencing parameters, tuned to the receiving hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneTiming {
    /// Silence before every tone.
    pub settle: Duration,
    pub tone: Duration,
    /// Held longer so the receiver can detect end-of-sequence.
    pub final_tone: Duration,
    /// Added to the tone duration while waiting for the tone to finish.
    pub margin: Duration,
    /// Silence between tones, not emitted after the last one.
    pub digit_gap: Duration,
}

impl Default for ToneTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(60),
            tone: Duration::from_millis(600),
            final_tone: Duration::from_millis(1050),
            margin: Duration::from_millis(60),
            digit_gap: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneEvent {
    /// Position of the character in the encoded code.
    pub index: usize,
    pub tone: DtmfTone,
    pub settle: Duration,
    pub duration: Duration,
    /// Time to wait after starting the tone.
    pub hold: Duration,
    /// Silence after the hold; zero for the final tone.
    pub gap: Duration,
}

impl ToneEvent {
    pub fn total(&self) -> Duration {
        self.settle + self.hold + self.gap
    }
}

/// Encode `code` into its playback schedule. Unmapped characters are
/// skipped; the last mapped character gets the final-tone duration.
pub fn encode(code: &str, timing: &ToneTiming) -> Vec<ToneEvent> {
    let mapped: Vec<(usize, DtmfTone)> = code
        .chars()
        .enumerate()
        .filter_map(|(index, c)| DtmfTone::from_char(c).map(|tone| (index, tone)))
        .collect();
    let count = mapped.len();

    mapped
        .into_iter()
        .enumerate()
        .map(|(position, (index, tone))| {
            let last = position + 1 == count;
            let duration = if last { timing.final_tone } else { timing.tone };
            ToneEvent {
                index,
                tone,
                settle: timing.settle,
                duration,
                hold: duration + timing.margin,
                gap: if last { Duration::ZERO } else { timing.digit_gap },
            }
        })
        .collect()
}

/// Wall-clock length of a full playback.
pub fn sequence_length(events: &[ToneEvent]) -> Duration {
    events.iter().map(ToneEvent::total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_all_twelve_keys() {
        let keys = "0123456789*#";
        for c in keys.chars() {
            let tone = DtmfTone::from_char(c).expect("keypad character");
            assert_eq!(tone.as_char(), c);
        }
        assert_eq!(DtmfTone::from_char('A'), None);
        assert_eq!(DtmfTone::from_char(' '), None);
    }

    #[test]
    fn standard_frequencies() {
        assert_eq!(DtmfTone::D1.frequencies(), (697.0, 1209.0));
        assert_eq!(DtmfTone::D0.frequencies(), (941.0, 1336.0));
        assert_eq!(DtmfTone::Pound.frequencies(), (941.0, 1477.0));
    }

    #[test]
    fn last_tone_is_held_longer() {
        let events = encode("1234", &ToneTiming::default());
        assert_eq!(events.len(), 4);
        for event in &events[..3] {
            assert_eq!(event.duration, Duration::from_millis(600));
            assert_eq!(event.hold, Duration::from_millis(660));
            assert_eq!(event.gap, Duration::from_millis(400));
            assert_eq!(event.settle, Duration::from_millis(60));
        }
        assert_eq!(events[3].duration, Duration::from_millis(1050));
        assert_eq!(events[3].hold, Duration::from_millis(1110));
        assert_eq!(events[3].gap, Duration::ZERO);
    }

    #[test]
    fn unmapped_characters_are_skipped() {
        let events = encode("1-2x", &ToneTiming::default());
        let tones: Vec<char> = events.iter().map(|e| e.tone.as_char()).collect();
        assert_eq!(tones, vec!['1', '2']);
        assert_eq!(events[1].index, 2);
        assert_eq!(events[1].duration, Duration::from_millis(1050));
    }

    #[test]
    fn empty_code_has_no_events() {
        assert!(encode("", &ToneTiming::default()).is_empty());
        assert!(encode("abc", &ToneTiming::default()).is_empty());
    }

    #[test]
    fn sequence_length_sums_every_phase() {
        let events = encode("12", &ToneTiming::default());
        // 60 + 660 + 400, then 60 + 1110
        assert_eq!(sequence_length(&events), Duration::from_millis(2290));
    }
}
