use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::dynamics::db_to_linear;
use crate::dsp::shape::soft_clip_buffer;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionParams {
    /// Pre-gain into the soft clipper, in dB. At or below zero the stage is
    /// an identity pass.
    pub drive_db: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self { drive_db: 0.0 }
    }
}

/// Soft-clip distortion. Gives the voice grit ("robot", "demon" presets)
/// without the harsh aliasing a hard clipper would add.
pub struct DistortionStage {
    drive_db: f32,
    drive: f32,
}

impl DistortionStage {
    pub fn new(params: DistortionParams) -> Self {
        Self {
            drive_db: params.drive_db,
            drive: db_to_linear(params.drive_db),
        }
    }
}

impl Stage for DistortionStage {
    fn id(&self) -> StageId {
        StageId::Distortion
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Distortion(p) = params {
            self.drive_db = p.drive_db;
            self.drive = db_to_linear(p.drive_db);
        } else {
            debug_assert!(false, "distortion stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        if self.drive_db <= 0.0 {
            return;
        }
        soft_clip_buffer(block, self.drive);
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_drive_is_exact_identity() {
        let mut stage = DistortionStage::new(DistortionParams { drive_db: 0.0 });
        let input = vec![0.9, -0.9, 0.2];
        let mut block = input.clone();
        stage.process(&mut block);

        assert_eq!(block, input);
    }

    #[test]
    fn drive_flattens_peaks() {
        let mut stage = DistortionStage::new(DistortionParams { drive_db: 18.0 });
        let mut block = vec![0.9, -0.9];
        stage.process(&mut block);

        // Heavily driven peaks approach but never reach the rails
        assert!(block[0] > 0.8 && block[0] < 1.0);
        assert!(block[1] < -0.8 && block[1] > -1.0);
    }

    #[test]
    fn output_is_bounded_for_any_drive() {
        let mut stage = DistortionStage::new(DistortionParams { drive_db: 60.0 });
        let mut block: Vec<f32> = (0..256).map(|i| ((i as f32) * 0.3).sin()).collect();
        stage.process(&mut block);

        assert!(block.iter().all(|s| s.abs() < 1.0));
    }
}
