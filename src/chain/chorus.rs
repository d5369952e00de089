use std::f32::consts::TAU;

use crate::chain::{Stage, StageId, StageParams};
use crate::dsp::delay::DelayLine;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Chorus
======

Mixes the dry voice with a copy running through a short delay whose length an
LFO sweeps. The sweep bends the copy's pitch up and down slightly, which
reads as several voices speaking together - or, with the LFO pushed to audio
rate (the "robot" preset drives it at 60 Hz), as a metallic ring modulation.

`depth` is the single intensity control, 0 to 1. It scales both the LFO
excursion around the ~7 ms base delay and the wet share of the mix, so depth
0 collapses to an exact identity: a fixed 7 ms copy mixed at a constant
level would comb-filter the voice even with no modulation, and "neutral"
must mean untouched.
*/

const BASE_DELAY_MS: f32 = 7.0;
/// Delay headroom: base delay, full excursion, and interpolation slack.
const MAX_DELAY_MS: f32 = 2.5 * BASE_DELAY_MS;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusParams {
    pub rate_hz: f32,
    pub depth: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            rate_hz: 1.0,
            depth: 0.2,
        }
    }
}

pub struct ChorusStage {
    delay_line: DelayLine,
    sample_rate: f32,
    lfo_phase: f32,
    rate_hz: f32,
    depth: f32,
}

impl ChorusStage {
    pub fn new(sample_rate: f32, params: ChorusParams) -> Self {
        let capacity = (MAX_DELAY_MS * 1e-3 * sample_rate) as usize + 2;
        Self {
            delay_line: DelayLine::new(capacity),
            sample_rate,
            lfo_phase: 0.0,
            rate_hz: params.rate_hz.clamp(0.01, 100.0),
            depth: params.depth.clamp(0.0, 1.0),
        }
    }
}

impl Stage for ChorusStage {
    fn id(&self) -> StageId {
        StageId::Chorus
    }

    fn set_params(&mut self, params: &StageParams) {
        if let StageParams::Chorus(p) = params {
            self.rate_hz = p.rate_hz.clamp(0.01, 100.0);
            self.depth = p.depth.clamp(0.0, 1.0);
        } else {
            debug_assert!(false, "chorus stage received {:?}", params);
        }
    }

    fn process(&mut self, block: &mut [f32]) {
        let phase_inc = TAU * self.rate_hz / self.sample_rate;
        let wet_mix = self.depth * 0.5;

        for sample in block.iter_mut() {
            let lfo = self.lfo_phase.sin();
            let delay_ms = BASE_DELAY_MS * (1.0 + lfo * self.depth);
            let delay_samples = (delay_ms * 1e-3 * self.sample_rate).max(2.0);

            let wet = self.delay_line.read_interpolated(delay_samples);
            self.delay_line.write(*sample);

            *sample = *sample * (1.0 - wet_mix) + wet * wet_mix;

            self.lfo_phase += phase_inc;
            if self.lfo_phase >= TAU {
                self.lfo_phase -= TAU;
            }
        }
    }

    fn reset(&mut self) {
        self.delay_line.reset();
        self.lfo_phase = 0.0;
    }
}
