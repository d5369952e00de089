use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::dynamics::{db_to_linear, smoothing_coeff};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gain recovery time after a peak has passed.
const RELEASE_MS: f32 = 50.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterParams {
    pub threshold_db: f32,
}

impl Default for LimiterParams {
    fn default() -> Self {
        Self { threshold_db: -0.5 }
    }
}

/// Hard ceiling, always the last stage in the chain.
///
/// The attack is instantaneous: whenever a sample would exceed the ceiling
/// the gain drops exactly far enough that it does not, so no peak ever gets
/// through. Release is smoothed so the level breathes back up instead of
/// pumping. A clipper would bound the signal too, but flattening every peak
/// sounds crunchy; riding the gain preserves the waveform shape.
pub struct LimiterStage {
    ceiling: f32,
    threshold_db: f32,
    release_coeff: f32,
    gain: f32,
}

impl LimiterStage {
    pub fn new(sample_rate: f32, params: LimiterParams) -> Self {
        Self {
            ceiling: db_to_linear(params.threshold_db),
            threshold_db: params.threshold_db,
            release_coeff: smoothing_coeff(RELEASE_MS, sample_rate),
            gain: 1.0,
        }
    }
}

impl Stage for LimiterStage {
    fn id(&self) -> StageId {
        StageId::Limiter
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Limiter(p) = params {
            self.threshold_db = p.threshold_db;
            self.ceiling = db_to_linear(p.threshold_db);
        } else {
            debug_assert!(false, "limiter stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let magnitude = sample.abs();
            if magnitude * self.gain > self.ceiling {
                self.gain = self.ceiling / magnitude.max(1e-9);
            } else {
                self.gain = 1.0 + self.release_coeff * (self.gain - 1.0);
            }
            *sample *= self.gain;
        }
    }

    fn reset(&mut self) {
        self.gain = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_exceeds_the_ceiling() {
        let mut limiter = LimiterStage::new(48_000.0, LimiterParams { threshold_db: -6.0 });
        let ceiling = db_to_linear(-6.0);

        let mut block: Vec<f32> = (0..4_096).map(|i| ((i as f32) * 0.3).sin() * 2.0).collect();
        limiter.process(&mut block);

        for sample in &block {
            assert!(
                sample.abs() <= ceiling + 1e-5,
                "peak {} over ceiling {}",
                sample,
                ceiling
            );
        }
    }

    #[test]
    fn quiet_signal_passes_untouched() {
        let mut limiter = LimiterStage::new(48_000.0, LimiterParams { threshold_db: -0.5 });

        let input = vec![0.1, -0.2, 0.3];
        let mut block = input.clone();
        limiter.process(&mut block);

        assert_eq!(block, input);
    }

    #[test]
    fn full_scale_impulse_at_zero_db_threshold_is_identity() {
        let mut limiter = LimiterStage::new(48_000.0, LimiterParams { threshold_db: 0.0 });

        let mut block = vec![1.0, 0.0, 0.0];
        limiter.process(&mut block);

        assert_eq!(block, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn gain_recovers_after_a_peak() {
        let mut limiter = LimiterStage::new(48_000.0, LimiterParams { threshold_db: -6.0 });

        let mut spike = vec![1.0f32];
        limiter.process(&mut spike);
        let ducked = limiter.gain;
        assert!(ducked < 1.0);

        // ~200 ms of quiet signal: gain should climb back toward 1.0
        let mut quiet = vec![0.01f32; 9_600];
        limiter.process(&mut quiet);
        assert!(limiter.gain > 0.95, "gain stuck at {}", limiter.gain);
    }
}
