use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::delay::DelayLine;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longest selectable echo time.
pub const MAX_DELAY_SECONDS: f32 = 2.0;
/// Feedback ceiling; at 1.0 the loop would recirculate forever.
pub const MAX_FEEDBACK: f32 = 0.99;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    pub delay_seconds: f32,
    pub feedback: f32,
    pub mix: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            delay_seconds: 0.2,
            feedback: 0.3,
            mix: 0.1,
        }
    }
}

/// Feedback echo. Every repeat passes through the feedback gain, so with
/// feedback below 1.0 the echo energy decays geometrically and the loop is
/// unconditionally stable.
pub struct DelayStage {
    line: DelayLine,
    sample_rate: f32,
    delay_samples: usize,
    feedback: f32,
    mix: f32,
}

impl DelayStage {
    pub fn new(sample_rate: f32, params: DelayParams) -> Self {
        let capacity = (MAX_DELAY_SECONDS * sample_rate) as usize + 2;
        let mut stage = Self {
            line: DelayLine::new(capacity),
            sample_rate,
            delay_samples: 1,
            feedback: 0.0,
            mix: 0.0,
        };
        stage.apply(params);
        stage
    }

    fn apply(&mut self, params: DelayParams) {
        let seconds = params.delay_seconds.clamp(0.0, MAX_DELAY_SECONDS);
        self.delay_samples = ((seconds * self.sample_rate) as usize).max(1);
        self.feedback = params.feedback.clamp(0.0, MAX_FEEDBACK);
        self.mix = params.mix.clamp(0.0, 1.0);
    }
}

impl Stage for DelayStage {
    fn id(&self) -> StageId {
        StageId::Delay
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Delay(p) = params {
            self.apply(*p);
        } else {
            debug_assert!(false, "delay stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let wet = self.line.read(self.delay_samples);
            self.line.write(*sample + wet * self.feedback);
            *sample = *sample * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.line.reset();
    }
}
