use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::dynamics::{db_to_linear, smoothing_coeff};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Noise Gate
==========

Silences the signal while it sits below a threshold, which keeps room tone,
fan noise and breath out of the chain between phrases. Gating BEFORE the
compressor matters: the compressor raises quiet passages, and an ungated
noise floor would come up with them.

The gate never snaps to zero. When the input drops under the threshold the
gain decays exponentially with the release time; an abrupt cut would click
every time the gate closes. When the input exceeds the threshold the gate
reopens immediately - voice onsets are fast and an opening ramp would swallow
consonants.

A threshold of -inf dB converts to linear 0.0, which no sample magnitude can
fall below, so the gate stays open permanently: the documented "disabled"
setting.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateParams {
    pub threshold_db: f32,
    pub release_ms: f32,
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            threshold_db: -50.0,
            release_ms: 100.0,
        }
    }
}

pub struct NoiseGate {
    params: GateParams,
    sample_rate: f32,
    threshold_linear: f32,
    release_coeff: f32,
    gain: f32,
}

impl NoiseGate {
    pub fn new(sample_rate: f32, params: GateParams) -> Self {
        let mut gate = Self {
            params,
            sample_rate,
            threshold_linear: 0.0,
            release_coeff: 0.0,
            gain: 1.0,
        };
        gate.recompute();
        gate
    }

    fn recompute(&mut self) {
        self.threshold_linear = db_to_linear(self.params.threshold_db);
        self.release_coeff = smoothing_coeff(self.params.release_ms, self.sample_rate);
    }
}

impl Stage for NoiseGate {
    fn id(&self) -> StageId {
        StageId::Gate
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Gate(p) = params {
            self.params = *p;
            self.recompute();
        } else {
            debug_assert!(false, "gate stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            if sample.abs() >= self.threshold_linear {
                self.gain = 1.0;
            } else {
                self.gain *= self.release_coeff;
            }
            *sample *= self.gain;
        }
    }

    fn reset(&mut self) {
        self.gain = 1.0;
    }
}
