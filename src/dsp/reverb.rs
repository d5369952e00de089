//! Schroeder reverberator.
//!
//! ```text
//! Input ──┬──→ [Comb 1] ──┐
//!         ├──→ [Comb 2] ──┤
//!         ├──→ [Comb 3] ──┼──→ (+) ──→ [Allpass 1] ──→ [Allpass 2] ──→ Output
//!         └──→ [Comb 4] ──┘
//! ```
//!
//! Four parallel feedback combs build the decaying echo density; their delay
//! times are mutually prime so the echoes never align into a resonant pitch.
//! Two series allpasses then smear the combined output, trading the metallic
//! comb character for a diffuse tail. Room size scales comb feedback (decay
//! time); damping is a one-pole lowpass inside each comb's feedback path that
//! absorbs highs the way soft surfaces do.

/// Feedback comb filter with damped feedback.
pub struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl CombFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: 0.5,
            damp: 0.5,
            filter_state: 0.0,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        // One-pole lowpass in the feedback loop absorbs high frequencies
        self.filter_state = output * (1.0 - self.damp) + self.filter_state * self.damp;

        self.buffer[self.write_pos] = input + self.filter_state * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.write_pos = 0;
    }
}

/// Allpass diffuser: passes all frequencies, scrambles their phase.
pub struct AllpassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: 0.5,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let output = -self.feedback * input + delayed;

        self.buffer[self.write_pos] = input + self.feedback * output;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Comb delay times in ms (mutually prime ratios for a dense tail).
const COMB_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
/// Allpass delay times in ms.
const ALLPASS_DELAYS_MS: [f32; 2] = [5.0, 1.7];

pub struct SchroederReverb {
    combs: [CombFilter; 4],
    allpasses: [AllpassFilter; 2],
}

impl SchroederReverb {
    /// Build the reverb network for a sample rate. Buffers are sized here;
    /// nothing allocates afterwards.
    pub fn new(sample_rate: f32) -> Self {
        let comb = |ms: f32| CombFilter::new((ms * sample_rate / 1000.0) as usize);
        let allpass = |ms: f32| AllpassFilter::new((ms * sample_rate / 1000.0) as usize);

        Self {
            combs: [
                comb(COMB_DELAYS_MS[0]),
                comb(COMB_DELAYS_MS[1]),
                comb(COMB_DELAYS_MS[2]),
                comb(COMB_DELAYS_MS[3]),
            ],
            allpasses: [allpass(ALLPASS_DELAYS_MS[0]), allpass(ALLPASS_DELAYS_MS[1])],
        }
    }

    /// Room size 0.0-1.0 maps to comb feedback 0.7-0.98 (decay time).
    pub fn set_room_size(&mut self, size: f32) {
        let feedback = 0.7 + size.clamp(0.0, 1.0) * 0.28;
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
        }
    }

    /// High-frequency absorption, 0.0 (bright) to 1.0 (dark).
    pub fn set_damping(&mut self, damp: f32) {
        for comb in &mut self.combs {
            comb.set_damp(damp);
        }
    }

    /// Process a single sample through the network.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut output = 0.0;
        for comb in &mut self.combs {
            output += comb.process(input);
        }
        output *= 0.25;

        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }

        output
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comb_filter_echoes_after_its_delay() {
        let mut comb = CombFilter::new(10);
        comb.set_feedback(0.5);
        comb.set_damp(0.0);

        let first = comb.process(1.0);
        assert!(first.abs() < 0.01);

        for _ in 0..9 {
            comb.process(0.0);
        }

        let echo = comb.process(0.0);
        assert!(echo.abs() > 0.4, "expected echo, got {}", echo);
    }

    #[test]
    fn reverb_produces_a_tail() {
        let mut reverb = SchroederReverb::new(48_000.0);
        reverb.set_room_size(0.5);
        reverb.set_damping(0.5);

        let _ = reverb.process(1.0);

        // Longest comb is ~44ms = ~2100 samples at 48kHz
        let mut has_tail = false;
        for _ in 0..5_000 {
            if reverb.process(0.0).abs() > 0.001 {
                has_tail = true;
                break;
            }
        }
        assert!(has_tail, "reverb should produce a tail after an impulse");
    }

    #[test]
    fn reverb_is_stable_at_max_room_size() {
        let mut reverb = SchroederReverb::new(48_000.0);
        reverb.set_room_size(1.0);

        for _ in 0..10_000 {
            let out = reverb.process(0.1);
            assert!(out.is_finite());
            assert!(out.abs() < 10.0, "reverb output unstable: {}", out);
        }
    }

    #[test]
    fn reset_silences_the_tail() {
        let mut reverb = SchroederReverb::new(48_000.0);
        reverb.set_room_size(0.8);
        reverb.process(1.0);
        reverb.reset();

        for _ in 0..5_000 {
            assert_eq!(reverb.process(0.0), 0.0);
        }
    }
}
