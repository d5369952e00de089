use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::dynamics::db_to_linear;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainParams {
    pub gain_db: f32,
}

impl Default for GainParams {
    fn default() -> Self {
        Self { gain_db: 0.0 }
    }
}

/// Linear gain with dB control. The chain uses one instance as the
/// "clarity" boost ahead of the pitch shifter.
pub struct GainStage {
    id: StageId,
    gain_db: f32,
    linear: f32,
}

impl GainStage {
    pub fn new(id: StageId, params: GainParams) -> Self {
        Self {
            id,
            gain_db: params.gain_db,
            linear: db_to_linear(params.gain_db),
        }
    }
}

impl Stage for GainStage {
    fn id(&self) -> StageId {
        self.id
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Gain(p) = params {
            self.gain_db = p.gain_db;
            self.linear = db_to_linear(p.gain_db);
        } else {
            debug_assert!(false, "gain stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        if self.linear == 1.0 {
            return;
        }
        for sample in block.iter_mut() {
            *sample *= self.linear;
        }
    }

    fn reset(&mut self) {}
}
