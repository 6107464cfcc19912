//! Reverb send: two feedback delay lines in series.

/// A single feedback comb: the delayed signal is fed back into the line.
#[derive(Debug, Clone)]
struct FeedbackDelay {
    line: Vec<f32>,
    pos: usize,
    feedback: f32,
}

impl FeedbackDelay {
    fn new(seconds: f32, feedback: f32, sample_rate: u32) -> Self {
        let len = ((seconds * sample_rate as f32).round() as usize).max(1);
        Self {
            line: vec![0.0; len],
            pos: 0,
            feedback,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line[self.pos];
        self.line[self.pos] = input + delayed * self.feedback;
        self.pos = (self.pos + 1) % self.line.len();
        delayed
    }
}

/// Send gain followed by two cascaded feedback delays. Output is wet only.
#[derive(Debug, Clone)]
pub struct Reverb {
    send: f32,
    stages: [FeedbackDelay; 2],
}

impl Reverb {
    pub const DEFAULT_SEND: f32 = 0.25;

    pub fn new(sample_rate: u32) -> Self {
        Self {
            send: Self::DEFAULT_SEND,
            stages: [
                FeedbackDelay::new(0.037, 0.5, sample_rate),
                FeedbackDelay::new(0.053, 0.45, sample_rate),
            ],
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let first = self.stages[0].process(input * self.send);
        self.stages[1].process(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_in_silence_out() {
        let mut reverb = Reverb::new(44100);
        for _ in 0..10_000 {
            assert_eq!(reverb.process(0.0), 0.0);
        }
    }

    #[test]
    fn impulse_arrives_after_both_delays() {
        let sr = 10_000;
        let mut reverb = Reverb::new(sr);
        let mut out = vec![reverb.process(1.0)];
        for _ in 0..2000 {
            out.push(reverb.process(0.0));
        }
        let first = out.iter().position(|s| s.abs() > 0.0).unwrap();
        // 370 + 530 samples at 10 kHz.
        assert_eq!(first, 900);
        assert!((out[first] - Reverb::DEFAULT_SEND).abs() < 1e-6);
    }

    #[test]
    fn tail_decays() {
        let mut reverb = Reverb::new(44100);
        reverb.process(1.0);
        let mut late = 0.0f32;
        for i in 0..88_200 {
            let s = reverb.process(0.0);
            if i > 80_000 {
                late = late.max(s.abs());
            }
        }
        assert!(late < 1e-4);
    }
}
