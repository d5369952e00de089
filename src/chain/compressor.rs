use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::dynamics::{db_to_linear, linear_to_db, EnvelopeFollower};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Compressor
==========

Evens out the level differences of a voice: loud syllables are pulled down
by `ratio`, quiet ones pass untouched, and the result sits more steadily in
front of the later nonlinear stages.

Gain computer, in dB:

    over = env_db - threshold_db          (only when positive)
    reduction = over * (1 - 1/ratio)

A 4:1 ratio turns 8 dB over the threshold into 2 dB over; ratio 1 makes the
reduction zero, the documented no-op. The envelope follower provides the
attack/release smoothing, so the gain moves at signal-level speed instead of
chattering per sample.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms: 1.0,
            release_ms: 100.0,
        }
    }
}

pub struct Compressor {
    params: CompressorParams,
    sample_rate: f32,
    follower: EnvelopeFollower,
}

impl Compressor {
    pub fn new(sample_rate: f32, params: CompressorParams) -> Self {
        let params = CompressorParams {
            ratio: params.ratio.max(1.0),
            ..params
        };
        Self {
            follower: EnvelopeFollower::new(params.attack_ms, params.release_ms, sample_rate),
            params,
            sample_rate,
        }
    }
}

impl Stage for Compressor {
    fn id(&self) -> StageId {
        StageId::Compressor
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Compressor(p) = params {
            self.params = CompressorParams {
                ratio: p.ratio.max(1.0),
                ..*p
            };
            self.follower
                .set_times(p.attack_ms, p.release_ms, self.sample_rate);
        } else {
            debug_assert!(false, "compressor stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        let threshold_db = self.params.threshold_db;
        let slope = 1.0 - 1.0 / self.params.ratio;
        if slope <= 0.0 {
            // ratio 1: keep the follower warm so engaging later is smooth
            for sample in block.iter() {
                self.follower.next(*sample);
            }
            return;
        }

        for sample in block.iter_mut() {
            let env = self.follower.next(*sample);
            let over_db = linear_to_db(env) - threshold_db;
            if over_db > 0.0 {
                *sample *= db_to_linear(-over_db * slope);
            }
        }
    }

    fn reset(&mut self) {
        self.follower.reset();
    }
}
