use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::reverb::SchroederReverb;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed high-frequency damping inside the comb feedback paths. Voice reverb
/// wants a dark tail; a bright one reads as "bathroom".
const DAMPING: f32 = 0.4;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    pub room_size: f32,
    pub wet_level: f32,
    pub dry_level: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.4,
            wet_level: 0.15,
            dry_level: 0.85,
        }
    }
}

/// Room ambience around the voice. Wet and dry levels are independent so a
/// preset can go fully wet without losing the option of a parallel dry path.
pub struct ReverbStage {
    reverb: SchroederReverb,
    wet_level: f32,
    dry_level: f32,
}

impl ReverbStage {
    pub fn new(sample_rate: f32, params: ReverbParams) -> Self {
        let mut reverb = SchroederReverb::new(sample_rate);
        reverb.set_damping(DAMPING);
        reverb.set_room_size(params.room_size.clamp(0.0, 1.0));

        Self {
            reverb,
            wet_level: params.wet_level.clamp(0.0, 1.0),
            dry_level: params.dry_level.clamp(0.0, 1.0),
        }
    }
}

impl Stage for ReverbStage {
    fn id(&self) -> StageId {
        StageId::Reverb
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Reverb(p) = params {
            self.reverb.set_room_size(p.room_size.clamp(0.0, 1.0));
            self.wet_level = p.wet_level.clamp(0.0, 1.0);
            self.dry_level = p.dry_level.clamp(0.0, 1.0);
        } else {
            debug_assert!(false, "reverb stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let wet = self.reverb.process(*sample);
            *sample = *sample * self.dry_level + wet * self.wet_level;
        }
    }

    fn reset(&mut self) {
        self.reverb.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_dry_no_wet_is_exact_identity() {
        let mut stage = ReverbStage::new(
            48_000.0,
            ReverbParams {
                room_size: 0.8,
                wet_level: 0.0,
                dry_level: 1.0,
            },
        );

        let input: Vec<f32> = (0..256).map(|i| ((i as f32) * 0.15).sin()).collect();
        let mut block = input.clone();
        stage.process(&mut block);

        assert_eq!(block, input);
    }

    #[test]
    fn wet_path_adds_a_tail() {
        let mut stage = ReverbStage::new(
            48_000.0,
            ReverbParams {
                room_size: 0.5,
                wet_level: 1.0,
                dry_level: 0.0,
            },
        );

        let mut impulse = vec![0.0f32; 64];
        impulse[0] = 1.0;
        stage.process(&mut impulse);

        let mut tail_energy = 0.0;
        for _ in 0..100 {
            let mut silence = vec![0.0f32; 64];
            stage.process(&mut silence);
            tail_energy += silence.iter().map(|x| x * x).sum::<f32>();
        }

        assert!(tail_energy > 0.001, "no reverb tail: {}", tail_energy);
    }

    #[test]
    fn levels_are_clamped_to_unit_range() {
        let stage = ReverbStage::new(
            48_000.0,
            ReverbParams {
                room_size: 2.0,
                wet_level: -1.0,
                dry_level: 5.0,
            },
        );

        assert_eq!(stage.wet_level, 0.0);
        assert_eq!(stage.dry_level, 1.0);
    }
}
