//! Built-in voice presets.
//!
//! A preset is a read-only bundle of per-stage parameter values applied
//! atomically: the audio thread installs every entry before processing the
//! next block, so a block never runs with half a preset.
//!
//! Every preset writes the same set of stages. A preset that only named the
//! stages it cares about would leave the previous preset's leftovers in the
//! others ("demon" narrows the lowpass; switching to "deep" must widen it
//! back).

use crate::chain::{
    ChorusParams, DistortionParams, FilterParams, GainParams, PitchParams, StageId, StageParams,
};

pub struct Preset {
    pub name: &'static str,
    pub entries: &'static [(StageId, StageParams)],
}

macro_rules! voice_preset {
    ($name:literal, pitch: $pitch:expr, gain: $gain:expr, drive: $drive:expr,
     chorus: ($rate:expr, $depth:expr), lowpass: $cutoff:expr) => {
        Preset {
            name: $name,
            entries: &[
                (
                    StageId::Pitch,
                    StageParams::Pitch(PitchParams { semitones: $pitch }),
                ),
                (
                    StageId::ClarityGain,
                    StageParams::Gain(GainParams { gain_db: $gain }),
                ),
                (
                    StageId::Distortion,
                    StageParams::Distortion(DistortionParams { drive_db: $drive }),
                ),
                (
                    StageId::Chorus,
                    StageParams::Chorus(ChorusParams {
                        rate_hz: $rate,
                        depth: $depth,
                    }),
                ),
                (
                    StageId::Lowpass,
                    StageParams::Filter(FilterParams { cutoff_hz: $cutoff }),
                ),
            ],
        }
    };
}

/// Identity: every touched stage back to its neutral setting.
pub static ORIGINAL: Preset = voice_preset!("original",
    pitch: 0.0, gain: 0.0, drive: 0.0, chorus: (1.0, 0.2), lowpass: 14_000.0);

/// Lowered voice with a small clarity boost to offset the darker timbre.
pub static DEEP: Preset = voice_preset!("deep",
    pitch: -5.0, gain: 2.0, drive: 0.0, chorus: (1.0, 0.2), lowpass: 14_000.0);

/// Raised voice, no other coloring.
pub static CHIPMUNK: Preset = voice_preset!("chipmunk",
    pitch: 6.0, gain: 0.0, drive: 0.0, chorus: (1.0, 0.2), lowpass: 14_000.0);

/// Audio-rate chorus modulation plus drive: metallic, machine-like.
pub static ROBOT: Preset = voice_preset!("robot",
    pitch: 0.0, gain: 0.0, drive: 12.0, chorus: (60.0, 0.9), lowpass: 14_000.0);

/// Higher and brighter.
pub static GIRL: Preset = voice_preset!("girl",
    pitch: 7.0, gain: 0.0, drive: 0.0, chorus: (1.0, 0.2), lowpass: 8_000.0);

/// Deep, driven and muffled.
pub static DEMON: Preset = voice_preset!("demon",
    pitch: -10.0, gain: 1.0, drive: 14.0, chorus: (20.0, 0.6), lowpass: 2_000.0);

pub static PRESETS: &[&Preset] = &[&ORIGINAL, &DEEP, &CHIPMUNK, &ROBOT, &GIRL, &DEMON];

/// Look a preset up by name, case-insensitively.
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS
        .iter()
        .copied()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(find("deep").is_some());
        assert!(find("DEEP").is_some());
        assert!(find("Chipmunk").is_some());
        assert!(find("no-such-preset").is_none());
    }

    #[test]
    fn all_presets_touch_the_same_stages() {
        let reference: Vec<StageId> = ORIGINAL.entries.iter().map(|(id, _)| *id).collect();
        for preset in PRESETS {
            let stages: Vec<StageId> = preset.entries.iter().map(|(id, _)| *id).collect();
            assert_eq!(stages, reference, "preset `{}` diverges", preset.name);
        }
    }

    #[test]
    fn original_preset_is_neutral_where_it_matters() {
        for (id, params) in ORIGINAL.entries {
            match (id, params) {
                (StageId::Pitch, StageParams::Pitch(p)) => assert_eq!(p.semitones, 0.0),
                (StageId::ClarityGain, StageParams::Gain(p)) => assert_eq!(p.gain_db, 0.0),
                (StageId::Distortion, StageParams::Distortion(p)) => assert_eq!(p.drive_db, 0.0),
                _ => {}
            }
        }
    }

    #[test]
    fn preset_pitches_stay_in_the_accepted_range() {
        for preset in PRESETS {
            for (_, params) in preset.entries {
                if let StageParams::Pitch(p) = params {
                    assert!(p.semitones.abs() <= 12.0, "preset `{}`", preset.name);
                }
            }
        }
    }
}
