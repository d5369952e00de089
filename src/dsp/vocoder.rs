use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/*
Phase-Vocoder Pitch Shifter
===========================

Shifts the pitch of a signal without changing its duration. Works in the
frequency domain over short overlapping windows (STFT):

  1. Collect FFT_SIZE input samples, window them (Hann), FFT.
  2. Analysis: for each bin, compare the phase against the previous frame to
     recover the *true* frequency inside the bin (the bin center is only a
     coarse estimate; the phase delta refines it).
  3. Shift: move each (magnitude, true frequency) pair to the bin nearest
     `bin * ratio`, scaling the frequency by the ratio.
  4. Synthesis: re-accumulate phases from the shifted frequencies, inverse
     FFT, window again and overlap-add into the output.

Frames advance by FFT_SIZE / OVERSAMPLE samples, so each output sample is the
sum of OVERSAMPLE windowed frames. With a Hann window at 4x overlap the
window contributions sum to a constant, making the pipeline an identity (up
to latency) at ratio 1.0.

Latency
-------

A frame can only be synthesized once a full window of input is buffered, so
the output lags the input by FFT_SIZE - STEP samples (768 samples = 16 ms at
48 kHz). The first STEP output samples after a reset are silence; callers
that need a gapless start should substitute the dry input until `latency()`
samples have been produced.

Quality trade-offs
------------------

FFT_SIZE 1024 at 48 kHz gives ~47 Hz bin spacing: fine enough to track voice
harmonics, short enough to keep transients from smearing. Larger windows
sharpen frequency resolution but blur consonants and add latency.
*/

pub const FFT_SIZE: usize = 1024;
pub const OVERSAMPLE: usize = 4;
/// Frame advance in samples.
pub const STEP: usize = FFT_SIZE / OVERSAMPLE;

/// Pitch ratio bounds: two octaves down to two octaves up.
pub const MIN_RATIO: f32 = 0.25;
pub const MAX_RATIO: f32 = 4.0;

const HALF: usize = FFT_SIZE / 2;

pub struct PitchShifter {
    sample_rate: f32,
    rover: usize,
    in_fifo: Vec<f32>,
    out_fifo: Vec<f32>,
    output_accum: Vec<f32>,
    window: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    last_phase: Vec<f32>,
    sum_phase: Vec<f32>,
    ana_magn: Vec<f32>,
    ana_freq: Vec<f32>,
    syn_magn: Vec<f32>,
    syn_freq: Vec<f32>,
    syn_weight: Vec<f32>,
    fft_forward: Arc<dyn Fft<f32>>,
    fft_inverse: Arc<dyn Fft<f32>>,
}

impl PitchShifter {
    pub fn new(sample_rate: f32) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft_forward = planner.plan_fft_forward(FFT_SIZE);
        let fft_inverse = planner.plan_fft_inverse(FFT_SIZE);

        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                let phase = TAU * i as f32 / FFT_SIZE as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        Self {
            sample_rate,
            rover: Self::latency_samples(),
            in_fifo: vec![0.0; FFT_SIZE],
            out_fifo: vec![0.0; STEP],
            output_accum: vec![0.0; FFT_SIZE],
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            last_phase: vec![0.0; HALF + 1],
            sum_phase: vec![0.0; HALF + 1],
            ana_magn: vec![0.0; HALF + 1],
            ana_freq: vec![0.0; HALF + 1],
            syn_magn: vec![0.0; HALF + 1],
            syn_freq: vec![0.0; HALF + 1],
            syn_weight: vec![0.0; HALF + 1],
            fft_forward,
            fft_inverse,
        }
    }

    const fn latency_samples() -> usize {
        FFT_SIZE - STEP
    }

    /// Samples by which the output lags the input.
    pub fn latency(&self) -> usize {
        Self::latency_samples()
    }

    /// Shift `block` in place by `pitch_ratio` (2.0 = one octave up).
    ///
    /// Steady-state path: no allocation, bounded work per sample plus one
    /// FFT pair every STEP samples.
    pub fn process(&mut self, block: &mut [f32], pitch_ratio: f32) {
        let ratio = pitch_ratio.clamp(MIN_RATIO, MAX_RATIO);
        let latency = Self::latency_samples();

        for sample in block.iter_mut() {
            self.in_fifo[self.rover] = *sample;
            *sample = self.out_fifo[self.rover - latency];
            self.rover += 1;

            if self.rover >= FFT_SIZE {
                self.process_frame(ratio);
                self.rover = latency;
            }
        }
    }

    fn process_frame(&mut self, ratio: f32) {
        let freq_per_bin = self.sample_rate / FFT_SIZE as f32;
        // Phase a bin center accumulates over one hop
        let expected = TAU * STEP as f32 / FFT_SIZE as f32;
        let oversample = OVERSAMPLE as f32;

        for k in 0..FFT_SIZE {
            self.fft_buffer[k] = Complex::new(self.in_fifo[k] * self.window[k], 0.0);
        }
        self.fft_forward.process(&mut self.fft_buffer);

        // Analysis: phase delta -> true frequency per bin
        for k in 0..=HALF {
            let bin = self.fft_buffer[k];
            let magn = bin.norm();
            let phase = bin.im.atan2(bin.re);

            let mut delta = phase - self.last_phase[k];
            self.last_phase[k] = phase;

            delta -= k as f32 * expected;
            // Wrap into (-pi, pi]
            let mut qpd = (delta / PI) as i32;
            if qpd >= 0 {
                qpd += qpd & 1;
            } else {
                qpd -= qpd & 1;
            }
            delta -= PI * qpd as f32;

            let deviation = oversample * delta / TAU;
            self.ana_magn[k] = magn;
            self.ana_freq[k] = (k as f32 + deviation) * freq_per_bin;
        }

        // Shift: move each bin to bin * ratio, frequency scaled by ratio
        self.syn_magn.fill(0.0);
        self.syn_freq.fill(0.0);
        self.syn_weight.fill(0.0);

        for k in 0..=HALF {
            let index = (k as f32 * ratio).round() as usize;
            if index <= HALF {
                self.syn_magn[index] += self.ana_magn[k];
                self.syn_freq[index] += self.ana_freq[k] * ratio;
                self.syn_weight[index] += 1.0;
            }
        }

        // Where several bins landed together, average their frequencies
        for k in 0..=HALF {
            if self.syn_weight[k] > 0.0 {
                self.syn_freq[k] /= self.syn_weight[k];
            } else {
                self.syn_freq[k] = k as f32 * freq_per_bin;
            }
        }

        // Synthesis: accumulate phases and rebuild a conjugate-symmetric
        // spectrum so the inverse transform is real
        for k in 0..=HALF {
            let deviation = self.syn_freq[k] / freq_per_bin - k as f32;
            self.sum_phase[k] += k as f32 * expected + TAU * deviation / oversample;

            let magn = self.syn_magn[k];
            let phase = self.sum_phase[k];
            let re = magn * phase.cos();
            let im = magn * phase.sin();

            if k == 0 || k == HALF {
                self.fft_buffer[k] = Complex::new(re, 0.0);
            } else {
                self.fft_buffer[k] = Complex::new(re, im);
                self.fft_buffer[FFT_SIZE - k] = Complex::new(re, -im);
            }
        }

        self.fft_inverse.process(&mut self.fft_buffer);

        // Overlap-add. 1/N undoes the unnormalized inverse transform; the
        // analysis and synthesis Hann windows overlap-sum to 3/8 * OVERSAMPLE,
        // which the second factor undoes for unity throughput at ratio 1.
        let scale = 1.0 / (FFT_SIZE as f32 * 0.375 * OVERSAMPLE as f32);
        for k in 0..FFT_SIZE {
            self.output_accum[k] += self.fft_buffer[k].re * scale * self.window[k];
        }

        self.out_fifo.copy_from_slice(&self.output_accum[..STEP]);
        self.output_accum.copy_within(STEP..FFT_SIZE, 0);
        self.output_accum[FFT_SIZE - STEP..].fill(0.0);
        self.in_fifo.copy_within(STEP..FFT_SIZE, 0);
        self.in_fifo[FFT_SIZE - STEP..].fill(0.0);
    }

    pub fn reset(&mut self) {
        self.rover = Self::latency_samples();
        self.in_fifo.fill(0.0);
        self.out_fifo.fill(0.0);
        self.output_accum.fill(0.0);
        self.last_phase.fill(0.0);
        self.sum_phase.fill(0.0);
    }
}
