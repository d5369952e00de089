//! The fixed-order voice effect chain.
//!
//! Each stage wraps one DSP algorithm with its parameter handling. Stages own
//! their internal state exclusively; the only thing that crosses the thread
//! boundary is a complete [`StageParams`] value, swapped in wholesale at a
//! block boundary (see [`crate::control`]).
//!
//! The topology is decided once at construction and never changes at runtime:
//! noise suppression and filtering come before dynamics, dynamics before
//! distortion, distortion before the spatial effects, and the limiter is
//! always last. Reordering audibly changes the result, so only per-stage
//! parameters are adjustable.

/// Modulated short delay thickener.
pub mod chorus;
/// Downward compressor with envelope smoothing.
pub mod compressor;
/// Feedback echo.
pub mod delay;
/// Soft-clip waveshaper.
pub mod distortion;
/// Highpass/lowpass biquad stages.
pub mod filter;
/// Plain dB gain.
pub mod gain;
/// Noise gate with exponential release.
pub mod gate;
/// Hard output ceiling.
pub mod limiter;
/// Phase-vocoder pitch shift.
pub mod pitch;
/// Schroeder reverb with wet/dry blend.
pub mod reverb;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use chorus::{ChorusParams, ChorusStage};
pub use compressor::{Compressor, CompressorParams};
pub use delay::{DelayParams, DelayStage};
pub use distortion::{DistortionParams, DistortionStage};
pub use filter::{FilterParams, FilterStage};
pub use gain::{GainParams, GainStage};
pub use gate::{GateParams, NoiseGate};
pub use limiter::{LimiterParams, LimiterStage};
pub use pitch::{PitchParams, PitchShiftStage};
pub use reverb::{ReverbParams, ReverbStage};

/// Stable identifier for each slot in the chain.
///
/// Stages are addressed by id, never by position, so the chain can be
/// reordered or extended without breaking the control surface.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Gate,
    Highpass,
    Compressor,
    ClarityGain,
    Pitch,
    Distortion,
    Chorus,
    Delay,
    Reverb,
    Lowpass,
    Limiter,
}

impl StageId {
    pub fn as_str(self) -> &'static str {
        match self {
            StageId::Gate => "gate",
            StageId::Highpass => "highpass",
            StageId::Compressor => "compressor",
            StageId::ClarityGain => "clarity_gain",
            StageId::Pitch => "pitch",
            StageId::Distortion => "distortion",
            StageId::Chorus => "chorus",
            StageId::Delay => "delay",
            StageId::Reverb => "reverb",
            StageId::Lowpass => "lowpass",
            StageId::Limiter => "limiter",
        }
    }
}

/// A complete parameter value for one stage.
///
/// Published as a whole and read as a whole; the audio thread never observes
/// a partially updated set.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageParams {
    Gate(GateParams),
    Filter(FilterParams),
    Compressor(CompressorParams),
    Gain(GainParams),
    Pitch(PitchParams),
    Distortion(DistortionParams),
    Chorus(ChorusParams),
    Delay(DelayParams),
    Reverb(ReverbParams),
    Limiter(LimiterParams),
}

/// One slot of the effect chain.
///
/// `process` runs on the audio thread: it must not allocate, lock, block, or
/// do unbounded work. `set_params` is also called from the audio thread (at a
/// block boundary, with a value handed over from the control thread), so the
/// same rules apply there.
pub trait Stage: Send {
    fn id(&self) -> StageId;

    /// Swap in a new parameter set. Values arrive pre-validated; a stage
    /// still clamps anything it cannot tolerate.
    fn set_params(&mut self, params: &StageParams);

    /// Process one mono block in place.
    fn process(&mut self, block: &mut [f32]);

    /// Clear internal signal state (filter memory, delay contents). Parameter
    /// values survive a reset.
    fn reset(&mut self);
}

/// The ordered chain plus bypass and master gain.
pub struct EffectChain {
    stages: Vec<Box<dyn Stage>>,
    pub bypass: bool,
    pub master_gain: f32,
}

impl EffectChain {
    /// Build the full voice chain for a sample rate. All allocation happens
    /// here; processing is allocation-free afterwards.
    pub fn new(sample_rate: f32) -> Self {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(NoiseGate::new(sample_rate, GateParams::default())),
            Box::new(FilterStage::highpass(sample_rate, 80.0)),
            Box::new(Compressor::new(sample_rate, CompressorParams::default())),
            Box::new(GainStage::new(StageId::ClarityGain, GainParams::default())),
            Box::new(PitchShiftStage::new(sample_rate, PitchParams::default())),
            Box::new(DistortionStage::new(DistortionParams::default())),
            Box::new(ChorusStage::new(sample_rate, ChorusParams::default())),
            Box::new(DelayStage::new(sample_rate, DelayParams::default())),
            Box::new(ReverbStage::new(sample_rate, ReverbParams::default())),
            Box::new(FilterStage::lowpass(sample_rate, 14_000.0)),
            Box::new(LimiterStage::new(sample_rate, LimiterParams::default())),
        ];

        Self {
            stages,
            bypass: false,
            master_gain: 1.0,
        }
    }

    /// Route a parameter set to the stage carrying `id`.
    pub fn apply(&mut self, id: StageId, params: &StageParams) {
        for stage in self.stages.iter_mut() {
            if stage.id() == id {
                stage.set_params(params);
                return;
            }
        }
        debug_assert!(false, "no stage with id {:?}", id);
    }

    /// Process one mono block in place.
    pub fn process(&mut self, block: &mut [f32]) {
        if self.bypass {
            clamp_block(block);
            return;
        }

        for stage in self.stages.iter_mut() {
            stage.process(block);
        }

        if self.master_gain != 1.0 {
            for sample in block.iter_mut() {
                *sample *= self.master_gain;
            }
        }

        // The limiter already bounds the signal; this backstop makes the
        // [-1, 1] contract unconditional even with an extreme master gain.
        clamp_block(block);
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

#[inline]
fn clamp_block(block: &mut [f32]) {
    for sample in block.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }
}
