use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::vocoder::PitchShifter;
use crate::MAX_BLOCK_SIZE;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semitone range accepted by the stage; wider requests are clamped.
pub const MAX_SEMITONES: f32 = 12.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchParams {
    pub semitones: f32,
}

impl Default for PitchParams {
    fn default() -> Self {
        Self { semitones: 0.0 }
    }
}

/// Pitch shift stage wrapping the phase vocoder.
///
/// Zero semitones short-circuits to an exact identity pass: running the
/// vocoder at ratio 1.0 would still smear transients slightly and add its
/// latency, and "no shift" should mean no artifacts at all.
///
/// The vocoder needs a full analysis window of history before it can produce
/// output. After construction, reset, or re-engaging from the zero-semitone
/// pass, the stage emits the dry input until that history exists instead of
/// emitting the vocoder's leading silence.
pub struct PitchShiftStage {
    shifter: PitchShifter,
    semitones: f32,
    ratio: f32,
    warmup_remaining: usize,
    dry: [f32; MAX_BLOCK_SIZE],
}

impl PitchShiftStage {
    pub fn new(sample_rate: f32, params: PitchParams) -> Self {
        let shifter = PitchShifter::new(sample_rate);
        let warmup = shifter.latency();
        let mut stage = Self {
            shifter,
            semitones: 0.0,
            ratio: 1.0,
            warmup_remaining: warmup,
            dry: [0.0; MAX_BLOCK_SIZE],
        };
        stage.set_semitones(params.semitones);
        stage
    }

    fn set_semitones(&mut self, semitones: f32) {
        let clamped = semitones.clamp(-MAX_SEMITONES, MAX_SEMITONES);
        let was_idle = self.semitones == 0.0;
        self.semitones = clamped;
        self.ratio = 2.0f32.powf(clamped / 12.0);

        // Coming out of the identity pass the vocoder has no history
        if was_idle && clamped != 0.0 {
            self.shifter.reset();
            self.warmup_remaining = self.shifter.latency();
        }
    }
}

impl Stage for PitchShiftStage {
    fn id(&self) -> StageId {
        StageId::Pitch
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Pitch(p) = params {
            self.set_semitones(p.semitones);
        } else {
            debug_assert!(false, "pitch stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        if self.semitones == 0.0 {
            return;
        }

        let len = block.len().min(MAX_BLOCK_SIZE);
        self.dry[..len].copy_from_slice(&block[..len]);

        self.shifter.process(&mut block[..len], self.ratio);

        if self.warmup_remaining > 0 {
            let take = self.warmup_remaining.min(len);
            block[..take].copy_from_slice(&self.dry[..take]);
            self.warmup_remaining -= take;
        }
    }

    fn reset(&mut self) {
        self.shifter.reset();
        self.warmup_remaining = self.shifter.latency();
    }
}
