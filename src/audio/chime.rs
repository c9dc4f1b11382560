use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const TONE_HZ: f32 = 880.0;
const TONE_SECS: f32 = 0.18;
const GAP_SECS: f32 = 0.12;
const TONES: u32 = 3;

/// Timer-end cue: three short sine bursts separated by silence. Finite
/// source, mono.
pub struct TimerChime {
    num_sample: usize,
    total_samples: usize,
}

impl TimerChime {
    pub fn new() -> Self {
        let cycle = ((TONE_SECS + GAP_SECS) * SAMPLE_RATE as f32) as usize;
        Self {
            num_sample: 0,
            total_samples: cycle * TONES as usize,
        }
    }
}

impl Iterator for TimerChime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        let cycle = ((TONE_SECS + GAP_SECS) * SAMPLE_RATE as f32) as usize;
        let within = self.num_sample % cycle;
        let tone_samples = (TONE_SECS * SAMPLE_RATE as f32) as usize;

        let sample = if within < tone_samples {
            let t = within as f32 / SAMPLE_RATE as f32;
            // Short linear fade at both edges to avoid clicks
            let fade = 0.01 * SAMPLE_RATE as f32;
            let envelope = (within as f32 / fade)
                .min((tone_samples - within) as f32 / fade)
                .clamp(0.0, 1.0);
            (2.0 * PI * TONE_HZ * t).sin() * envelope
        } else {
            0.0
        };

        self.num_sample += 1;
        Some(sample * 0.2) // Lower amplitude to prevent clipping
    }
}

impl Source for TimerChime {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            (TONE_SECS + GAP_SECS) * TONES as f32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chime_is_finite() {
        let samples: Vec<f32> = TimerChime::new().collect();
        let expected = (((TONE_SECS + GAP_SECS) * SAMPLE_RATE as f32) as usize) * TONES as usize;
        assert_eq!(samples.len(), expected);
    }

    #[test]
    fn chime_alternates_tone_and_silence() {
        let samples: Vec<f32> = TimerChime::new().collect();
        let tone_samples = (TONE_SECS * SAMPLE_RATE as f32) as usize;
        let cycle = ((TONE_SECS + GAP_SECS) * SAMPLE_RATE as f32) as usize;

        // Middle of the first tone is audible, middle of the first gap is not.
        assert!(samples[tone_samples / 2].abs() > 0.0);
        let gap_mid = tone_samples + (cycle - tone_samples) / 2;
        assert_eq!(samples[gap_mid], 0.0);
    }
}
