use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::filter::{Biquad, BiquadKind, MAX_CUTOFF_RATIO, MIN_CUTOFF_HZ};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub cutoff_hz: f32,
}

/// Highpass or lowpass slot in the chain.
///
/// The same stage type serves both the `Highpass` and `Lowpass` ids; the
/// constructor decides which. A cutoff clamped all the way to its boundary
/// (floor for highpass, ceiling for lowpass) means "wide open" and the stage
/// passes the block through untouched.
pub struct FilterStage {
    id: StageId,
    filter: Biquad,
    sample_rate: f32,
    active: bool,
}

impl FilterStage {
    pub fn highpass(sample_rate: f32, cutoff_hz: f32) -> Self {
        Self::build(
            StageId::Highpass,
            Biquad::highpass(cutoff_hz, sample_rate),
            sample_rate,
        )
    }

    pub fn lowpass(sample_rate: f32, cutoff_hz: f32) -> Self {
        Self::build(
            StageId::Lowpass,
            Biquad::lowpass(cutoff_hz, sample_rate),
            sample_rate,
        )
    }

    fn build(id: StageId, filter: Biquad, sample_rate: f32) -> Self {
        let mut stage = Self {
            id,
            filter,
            sample_rate,
            active: true,
        };
        stage.update_active();
        stage
    }

    fn update_active(&mut self) {
        let cutoff = self.filter.cutoff_hz();
        self.active = match self.filter.kind() {
            BiquadKind::Highpass => cutoff > MIN_CUTOFF_HZ,
            BiquadKind::Lowpass => cutoff < MAX_CUTOFF_RATIO * self.sample_rate,
        };
    }
}

impl Stage for FilterStage {
    fn id(&self) -> StageId {
        self.id
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Filter(p) = params {
            self.filter.set_cutoff(p.cutoff_hz);
            self.update_active();
        } else {
            debug_assert!(false, "filter stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        if self.active {
            self.filter.process(block);
        }
    }

    fn reset(&mut self) {
        self.filter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highpass_removes_dc_offset() {
        let mut stage = FilterStage::highpass(48_000.0, 80.0);
        let mut block = vec![0.5; 8_192];
        stage.process(&mut block);

        assert!(block[8_191].abs() < 0.01);
    }

    #[test]
    fn lowpass_at_ceiling_is_identity() {
        let mut stage = FilterStage::lowpass(48_000.0, 14_000.0);
        stage.set_params(&StageParams::Filter(FilterParams {
            cutoff_hz: 48_000.0,
        }));

        let input: Vec<f32> = (0..128).map(|i| ((i as f32) * 0.7).sin()).collect();
        let mut block = input.clone();
        stage.process(&mut block);

        assert_eq!(block, input);
    }

    #[test]
    fn highpass_at_floor_is_identity() {
        let mut stage = FilterStage::highpass(48_000.0, 80.0);
        stage.set_params(&StageParams::Filter(FilterParams { cutoff_hz: 0.0 }));

        let input = vec![0.25; 64];
        let mut block = input.clone();
        stage.process(&mut block);

        assert_eq!(block, input);
    }

    #[test]
    fn reports_its_configured_slot() {
        assert_eq!(FilterStage::highpass(48_000.0, 80.0).id(), StageId::Highpass);
        assert_eq!(FilterStage::lowpass(48_000.0, 14_000.0).id(), StageId::Lowpass);
    }
}
