//! Control-thread to audio-thread parameter handoff.
//!
//! The control side (CLI prompt, remote command handler) and the audio
//! callback never share a lock. A mutex here would let a preempted control
//! thread hold the audio thread past its block deadline - the classic
//! priority-inversion dropout. Instead:
//!
//! * Complete [`StageParams`] values travel through a wait-free SPSC ring
//!   (rtrb). The control side is the only producer, the audio side the only
//!   consumer, and each message is one whole parameter set - the audio
//!   thread can never observe a torn or half-written value.
//! * A preset is a single message carrying all of its per-stage entries; the
//!   audio thread installs them all before the next block, so a preset is
//!   atomic from its point of view.
//! * Bypass and master gain are single words, shared as plain atomics.
//!
//! The audio side drains the whole ring once per block. Draining fully gives
//! last-writer-wins per stage: two pitch writes queued in the same block
//! interval both apply, in order, and the block runs with the second.
//!
//! Validation happens on the control side, before anything is published.
//! A rejected write returns [`ParamError`] and leaves the live value alone.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};
use thiserror::Error;

use crate::chain::{
    delay::{MAX_DELAY_SECONDS, MAX_FEEDBACK},
    pitch::MAX_SEMITONES,
    StageId, StageParams,
};
use crate::preset::{self, Preset};

/// Queue depth for pending updates. 64 complete parameter sets queued within
/// one block interval is far beyond any real control surface.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Master gain ceiling (linear). +18 dB of make-up is already shouting.
pub const MAX_MASTER_GAIN: f32 = 8.0;

/// One pending change, as seen by the audio thread.
#[derive(Clone, Copy)]
pub enum ChainUpdate {
    Stage(StageId, StageParams),
    Preset(&'static Preset),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("pitch {0} semitones is outside [-{max}, {max}]", max = MAX_SEMITONES)]
    PitchOutOfRange(f32),
    #[error("master gain {0} is outside [0, {max}]", max = MAX_MASTER_GAIN)]
    MasterGainOutOfRange(f32),
    #[error("cutoff {0} Hz is not inside (0, {1}) for this stream")]
    CutoffOutOfRange(f32, f32),
    #[error("delay time {0} s is outside (0, {max}]", max = MAX_DELAY_SECONDS)]
    DelayTimeOutOfRange(f32),
    #[error("feedback {0} is outside [0, {max}]", max = MAX_FEEDBACK)]
    FeedbackOutOfRange(f32),
    #[error("{name} {value} is outside [0, 1]")]
    UnitRangeExceeded { name: &'static str, value: f32 },
    #[error("compression ratio {0} is below 1")]
    RatioBelowOne(f32),
    #[error("{name} {value} ms is negative")]
    NegativeTime { name: &'static str, value: f32 },
    #[error("{name} {value} is not a number")]
    NotANumber { name: &'static str, value: f32 },
    #[error("threshold {0} dB is above 0")]
    ThresholdAboveZero(f32),
    #[error("drive {0} dB is outside [0, 60]")]
    DriveOutOfRange(f32),
    #[error("LFO rate {0} Hz is outside (0, 100]")]
    RateOutOfRange(f32),
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
    #[error("parameter {params:?} does not fit stage `{id:?}`")]
    StageMismatch { id: StageId, params: StageParams },
    #[error("control queue is full; update dropped")]
    QueueFull,
}

/// Control-side snapshot for `status` style queries. Served entirely from the
/// sender's shadow state; the audio thread is never consulted.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlStatus {
    pub bypass: bool,
    pub pitch_semitones: f32,
    pub master_gain: f32,
    pub preset: &'static str,
}

struct SharedFlags {
    bypass: AtomicBool,
    master_gain_bits: AtomicU32,
}

/// Build a connected sender/receiver pair.
///
/// `sample_rate` is only used to validate cutoff frequencies against the
/// stream's Nyquist limit; the chain clamps again on its own sample rate.
pub fn param_channel(sample_rate: f32, capacity: usize) -> (ParamSender, ParamReceiver) {
    let (tx, rx) = RingBuffer::new(capacity.max(1));
    let flags = Arc::new(SharedFlags {
        bypass: AtomicBool::new(false),
        master_gain_bits: AtomicU32::new(1.0f32.to_bits()),
    });

    let sender = ParamSender {
        tx,
        flags: Arc::clone(&flags),
        sample_rate,
        bypass: false,
        pitch_semitones: 0.0,
        master_gain: 1.0,
        preset_name: "original",
    };
    let receiver = ParamReceiver { rx, flags };

    (sender, receiver)
}

/// The control side: validates and publishes parameter changes.
pub struct ParamSender {
    tx: Producer<ChainUpdate>,
    flags: Arc<SharedFlags>,
    sample_rate: f32,
    bypass: bool,
    pitch_semitones: f32,
    master_gain: f32,
    preset_name: &'static str,
}

impl ParamSender {
    /// Update the sample rate used for cutoff validation once the stream has
    /// negotiated its real rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Publish a complete parameter set for one stage.
    pub fn set_stage(&mut self, id: StageId, params: StageParams) -> Result<(), ParamError> {
        validate(self.sample_rate, id, &params)?;
        self.push(ChainUpdate::Stage(id, params))?;

        if let StageParams::Pitch(p) = params {
            self.pitch_semitones = p.semitones;
        }
        self.preset_name = "custom";
        Ok(())
    }

    /// Set the pitch shift in semitones, range [-12, 12].
    pub fn set_pitch(&mut self, semitones: f32) -> Result<(), ParamError> {
        self.set_stage(
            StageId::Pitch,
            StageParams::Pitch(crate::chain::PitchParams { semitones }),
        )
    }

    /// Apply a named preset atomically.
    pub fn apply_preset(&mut self, name: &str) -> Result<(), ParamError> {
        let preset =
            preset::find(name).ok_or_else(|| ParamError::UnknownPreset(name.to_string()))?;
        self.push(ChainUpdate::Preset(preset))?;

        for (_, params) in preset.entries {
            if let StageParams::Pitch(p) = params {
                self.pitch_semitones = p.semitones;
            }
        }
        self.preset_name = preset.name;
        Ok(())
    }

    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
        self.flags.bypass.store(bypass, Ordering::Relaxed);
    }

    /// Flip bypass and return the new state.
    pub fn toggle_bypass(&mut self) -> bool {
        self.set_bypass(!self.bypass);
        self.bypass
    }

    /// Set the master output gain as a linear multiplier.
    pub fn set_master_gain(&mut self, multiplier: f32) -> Result<(), ParamError> {
        if !multiplier.is_finite() || !(0.0..=MAX_MASTER_GAIN).contains(&multiplier) {
            return Err(ParamError::MasterGainOutOfRange(multiplier));
        }
        self.master_gain = multiplier;
        self.flags
            .master_gain_bits
            .store(multiplier.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    pub fn status(&self) -> ControlStatus {
        ControlStatus {
            bypass: self.bypass,
            pitch_semitones: self.pitch_semitones,
            master_gain: self.master_gain,
            preset: self.preset_name,
        }
    }

    fn push(&mut self, update: ChainUpdate) -> Result<(), ParamError> {
        self.tx.push(update).map_err(|_| ParamError::QueueFull)
    }
}

/// The audio side: polled once per block, wait-free, allocation-free.
pub struct ParamReceiver {
    rx: Consumer<ChainUpdate>,
    flags: Arc<SharedFlags>,
}

impl ParamReceiver {
    pub fn bypass(&self) -> bool {
        self.flags.bypass.load(Ordering::Relaxed)
    }

    pub fn master_gain(&self) -> f32 {
        f32::from_bits(self.flags.master_gain_bits.load(Ordering::Relaxed))
    }

    /// Drain every pending update, invoking `apply` per stage entry. Preset
    /// bundles expand here, inside a single drain, which is what makes them
    /// atomic with respect to block processing.
    pub fn poll(&mut self, mut apply: impl FnMut(StageId, &StageParams)) {
        while let Ok(update) = self.rx.pop() {
            match update {
                ChainUpdate::Stage(id, params) => apply(id, &params),
                ChainUpdate::Preset(preset) => {
                    for (id, params) in preset.entries {
                        apply(*id, params);
                    }
                }
            }
        }
    }
}

fn check_unit(name: &'static str, value: f32) -> Result<(), ParamError> {
    if value.is_nan() {
        return Err(ParamError::NotANumber { name, value });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ParamError::UnitRangeExceeded { name, value });
    }
    Ok(())
}

fn check_time(name: &'static str, value: f32) -> Result<(), ParamError> {
    if value.is_nan() {
        return Err(ParamError::NotANumber { name, value });
    }
    if value < 0.0 {
        return Err(ParamError::NegativeTime { name, value });
    }
    Ok(())
}

/// Threshold in dB: anything at or below 0 dB full scale, -inf included.
fn check_threshold(value: f32) -> Result<(), ParamError> {
    if value.is_nan() {
        return Err(ParamError::NotANumber {
            name: "threshold",
            value,
        });
    }
    if value > 0.0 {
        return Err(ParamError::ThresholdAboveZero(value));
    }
    Ok(())
}

/// Validate a parameter set against the ranges the chain guarantees to
/// honor. Runs on the control thread only.
pub fn validate(sample_rate: f32, id: StageId, params: &StageParams) -> Result<(), ParamError> {
    match (id, params) {
        (StageId::Gate, StageParams::Gate(p)) => {
            check_threshold(p.threshold_db)?;
            check_time("release", p.release_ms)
        }
        (StageId::Highpass | StageId::Lowpass, StageParams::Filter(p)) => {
            let nyquist = sample_rate / 2.0;
            if !p.cutoff_hz.is_finite() || p.cutoff_hz <= 0.0 || p.cutoff_hz >= nyquist {
                return Err(ParamError::CutoffOutOfRange(p.cutoff_hz, nyquist));
            }
            Ok(())
        }
        (StageId::Compressor, StageParams::Compressor(p)) => {
            check_threshold(p.threshold_db)?;
            check_time("attack", p.attack_ms)?;
            check_time("release", p.release_ms)?;
            if p.ratio.is_nan() || p.ratio < 1.0 {
                return Err(ParamError::RatioBelowOne(p.ratio));
            }
            Ok(())
        }
        (StageId::ClarityGain, StageParams::Gain(p)) => {
            if p.gain_db.is_nan() {
                return Err(ParamError::NotANumber {
                    name: "gain",
                    value: p.gain_db,
                });
            }
            Ok(())
        }
        (StageId::Pitch, StageParams::Pitch(p)) => {
            if p.semitones.is_nan() || p.semitones.abs() > MAX_SEMITONES {
                return Err(ParamError::PitchOutOfRange(p.semitones));
            }
            Ok(())
        }
        (StageId::Distortion, StageParams::Distortion(p)) => {
            if p.drive_db.is_nan() || !(0.0..=60.0).contains(&p.drive_db) {
                return Err(ParamError::DriveOutOfRange(p.drive_db));
            }
            Ok(())
        }
        (StageId::Chorus, StageParams::Chorus(p)) => {
            if p.rate_hz.is_nan() || p.rate_hz <= 0.0 || p.rate_hz > 100.0 {
                return Err(ParamError::RateOutOfRange(p.rate_hz));
            }
            check_unit("depth", p.depth)
        }
        (StageId::Delay, StageParams::Delay(p)) => {
            if p.delay_seconds.is_nan()
                || p.delay_seconds <= 0.0
                || p.delay_seconds > MAX_DELAY_SECONDS
            {
                return Err(ParamError::DelayTimeOutOfRange(p.delay_seconds));
            }
            if p.feedback.is_nan() || !(0.0..=MAX_FEEDBACK).contains(&p.feedback) {
                return Err(ParamError::FeedbackOutOfRange(p.feedback));
            }
            check_unit("mix", p.mix)
        }
        (StageId::Reverb, StageParams::Reverb(p)) => {
            check_unit("room size", p.room_size)?;
            check_unit("wet level", p.wet_level)?;
            check_unit("dry level", p.dry_level)
        }
        (StageId::Limiter, StageParams::Limiter(p)) => check_threshold(p.threshold_db),
        (id, params) => Err(ParamError::StageMismatch {
            id,
            params: *params,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::DelayParams;

    const SR: f32 = 48_000.0;

    #[test]
    fn pitch_outside_range_is_rejected() {
        let (mut sender, _receiver) = param_channel(SR, 8);

        assert_eq!(
            sender.set_pitch(13.0),
            Err(ParamError::PitchOutOfRange(13.0))
        );
        assert_eq!(sender.set_pitch(f32::NAN).is_err(), true);
        assert!(sender.set_pitch(-12.0).is_ok());
    }

    #[test]
    fn rejected_write_publishes_nothing() {
        let (mut sender, mut receiver) = param_channel(SR, 8);

        let _ = sender.set_pitch(99.0);

        let mut seen = 0;
        receiver.poll(|_, _| seen += 1);
        assert_eq!(seen, 0);
    }

    #[test]
    fn last_write_before_the_block_wins() {
        let (mut sender, mut receiver) = param_channel(SR, 8);

        sender.set_pitch(-5.0).unwrap();
        sender.set_pitch(6.0).unwrap();

        let mut last = None;
        receiver.poll(|id, params| {
            if let (StageId::Pitch, StageParams::Pitch(p)) = (id, params) {
                last = Some(p.semitones);
            }
        });

        assert_eq!(last, Some(6.0));
    }

    #[test]
    fn preset_arrives_as_one_atomic_bundle() {
        let (mut sender, mut receiver) = param_channel(SR, 8);

        sender.apply_preset("deep").unwrap();

        let mut applied = Vec::new();
        receiver.poll(|id, _| applied.push(id));

        let expected: Vec<StageId> = crate::preset::DEEP
            .entries
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(applied, expected);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let (mut sender, _receiver) = param_channel(SR, 8);

        assert!(matches!(
            sender.apply_preset("yodeling"),
            Err(ParamError::UnknownPreset(_))
        ));
    }

    #[test]
    fn full_queue_reports_and_drops() {
        let (mut sender, _receiver) = param_channel(SR, 2);

        assert!(sender.set_pitch(1.0).is_ok());
        assert!(sender.set_pitch(2.0).is_ok());
        assert_eq!(sender.set_pitch(3.0), Err(ParamError::QueueFull));
    }

    #[test]
    fn bypass_and_master_gain_cross_without_the_queue() {
        let (mut sender, receiver) = param_channel(SR, 2);

        sender.set_bypass(true);
        sender.set_master_gain(1.5).unwrap();

        assert!(receiver.bypass());
        assert_eq!(receiver.master_gain(), 1.5);
    }

    #[test]
    fn master_gain_is_validated() {
        let (mut sender, receiver) = param_channel(SR, 2);

        assert!(sender.set_master_gain(-1.0).is_err());
        assert!(sender.set_master_gain(f32::INFINITY).is_err());
        assert_eq!(receiver.master_gain(), 1.0);
    }

    #[test]
    fn status_tracks_the_shadow_state() {
        let (mut sender, _receiver) = param_channel(SR, 8);

        sender.set_pitch(-5.0).unwrap();
        sender.set_bypass(true);

        let status = sender.status();
        assert_eq!(status.pitch_semitones, -5.0);
        assert!(status.bypass);
        assert_eq!(status.preset, "custom");

        sender.apply_preset("robot").unwrap();
        assert_eq!(sender.status().preset, "robot");
    }

    #[test]
    fn mismatched_stage_and_params_are_rejected() {
        let result = validate(
            SR,
            StageId::Pitch,
            &StageParams::Delay(DelayParams::default()),
        );
        assert!(matches!(result, Err(ParamError::StageMismatch { .. })));
    }

    #[test]
    fn delay_validation_covers_all_fields() {
        let bad_feedback = StageParams::Delay(DelayParams {
            delay_seconds: 0.2,
            feedback: 1.2,
            mix: 0.1,
        });
        assert!(matches!(
            validate(SR, StageId::Delay, &bad_feedback),
            Err(ParamError::FeedbackOutOfRange(_))
        ));

        let bad_time = StageParams::Delay(DelayParams {
            delay_seconds: -0.5,
            feedback: 0.3,
            mix: 0.1,
        });
        assert!(matches!(
            validate(SR, StageId::Delay, &bad_time),
            Err(ParamError::DelayTimeOutOfRange(_))
        ));
    }

    #[test]
    fn gate_accepts_negative_infinity_threshold() {
        use crate::chain::GateParams;
        let params = StageParams::Gate(GateParams {
            threshold_db: f32::NEG_INFINITY,
            release_ms: 100.0,
        });
        assert!(validate(SR, StageId::Gate, &params).is_ok());
    }

    #[test]
    fn pitch_shadow_survives_a_full_queue() {
        let (mut sender, _receiver) = param_channel(SR, 1);

        sender.set_pitch(2.0).unwrap();
        let _ = sender.set_pitch(7.0); // dropped: queue full

        // Shadow only reflects what was actually published
        assert_eq!(sender.status().pitch_semitones, 2.0);
    }
}
