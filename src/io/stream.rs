//! Duplex stream driver.
//!
//! Two independent cpal streams form the path: the input callback downmixes
//! the hardware buffer to mono, runs the engine, and pushes the processed
//! samples into a wait-free ring; the output callback pops from the ring and
//! fans the mono signal out to every output channel. The ring absorbs the
//! scheduling jitter between the two callbacks.
//!
//! Under/overruns are survivable by design: a starved output emits silence
//! for the missing samples, a stalled output makes the input drop samples,
//! and in both cases the stream keeps running.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::control::ParamReceiver;
use crate::engine::AudioEngine;
use crate::io::{devices, StreamError};
use crate::MAX_BLOCK_SIZE;

#[derive(Debug, Clone, Default)]
pub struct StreamSettings {
    /// Substring match against input device names; `None` selects by role.
    pub input_name: Option<String>,
    /// Substring match against output device names; `None` selects by role.
    pub output_name: Option<String>,
    /// Request a specific rate instead of the output device's default.
    pub sample_rate: Option<u32>,
    /// Request a fixed hardware buffer size in frames (latency control).
    pub block_size: Option<u32>,
}

/// A running duplex stream. Dropping it stops both directions.
pub struct VoiceStream {
    _input: cpal::Stream,
    _output: cpal::Stream,
    pub sample_rate: u32,
    pub input_name: String,
    pub output_name: String,
}

/// Open both devices, wire the engine between them, and start streaming.
pub fn start(settings: &StreamSettings, params: ParamReceiver) -> Result<VoiceStream, StreamError> {
    let host = cpal::default_host();
    let input_device = devices::input_device(&host, settings.input_name.as_deref())?;
    let output_device = devices::output_device(&host, settings.output_name.as_deref())?;

    let input_default = input_device.default_input_config()?;
    let output_default = output_device.default_output_config()?;
    let mut input_config = input_default.config();
    let mut output_config = output_default.config();

    if let Some(rate) = settings.sample_rate {
        input_config.sample_rate = cpal::SampleRate(rate);
        output_config.sample_rate = cpal::SampleRate(rate);
    } else {
        // One engine, one rate: run the capture side at the playback rate
        input_config.sample_rate = output_config.sample_rate;
    }
    if let Some(frames) = settings.block_size {
        input_config.buffer_size = cpal::BufferSize::Fixed(frames);
        output_config.buffer_size = cpal::BufferSize::Fixed(frames);
    }

    let sample_rate = output_config.sample_rate.0;
    let input_channels = input_config.channels as usize;
    let output_channels = output_config.channels as usize;

    let period = match output_config.buffer_size {
        cpal::BufferSize::Fixed(frames) => frames as usize,
        _ => 1_024,
    };
    let (producer, consumer) = RingBuffer::<f32>::new((period * 8).max(8_192));

    let engine = AudioEngine::new(sample_rate as f32, params);

    let input_name = input_device.name().unwrap_or_else(|_| "<unnamed>".into());
    let output_name = output_device.name().unwrap_or_else(|_| "<unnamed>".into());
    tracing::info!(
        input = %input_name,
        output = %output_name,
        sample_rate,
        "starting duplex stream"
    );

    let input = match input_default.sample_format() {
        cpal::SampleFormat::F32 => {
            build_input::<f32>(&input_device, &input_config, engine, producer, input_channels)?
        }
        cpal::SampleFormat::I16 => {
            build_input::<i16>(&input_device, &input_config, engine, producer, input_channels)?
        }
        cpal::SampleFormat::U16 => {
            build_input::<u16>(&input_device, &input_config, engine, producer, input_channels)?
        }
        other => return Err(StreamError::UnsupportedFormat(other)),
    };

    let output = match output_default.sample_format() {
        cpal::SampleFormat::F32 => {
            build_output::<f32>(&output_device, &output_config, consumer, output_channels)?
        }
        cpal::SampleFormat::I16 => {
            build_output::<i16>(&output_device, &output_config, consumer, output_channels)?
        }
        cpal::SampleFormat::U16 => {
            build_output::<u16>(&output_device, &output_config, consumer, output_channels)?
        }
        other => return Err(StreamError::UnsupportedFormat(other)),
    };

    input.play()?;
    output.play()?;

    Ok(VoiceStream {
        _input: input,
        _output: output,
        sample_rate,
        input_name,
        output_name,
    })
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: AudioEngine,
    mut producer: Producer<f32>,
    channels: usize,
) -> Result<cpal::Stream, StreamError>
where
    T: cpal::SizedSample,
    f32: FromSample<T>,
{
    let channels = channels.max(1);
    let mut mono = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_input_stream::<T, _, _>(
        config,
        move |data: &[T], _| {
            let frames = data.len() / channels;
            let mut offset = 0;
            while offset < frames {
                let len = (frames - offset).min(MAX_BLOCK_SIZE);
                for i in 0..len {
                    let frame = &data[(offset + i) * channels..][..channels];
                    let mut sum = 0.0f32;
                    for sample in frame {
                        sum += f32::from_sample(*sample);
                    }
                    mono[i] = sum / channels as f32;
                }

                engine.process_block(&mut mono[..len]);

                for &sample in &mono[..len] {
                    // Ring full: the output side stalled; drop and move on
                    if producer.push(sample).is_err() {
                        break;
                    }
                }
                offset += len;
            }
        },
        |err| tracing::warn!("input stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: Consumer<f32>,
    channels: usize,
) -> Result<cpal::Stream, StreamError>
where
    T: cpal::SizedSample + FromSample<f32>,
{
    let channels = channels.max(1);

    let stream = device.build_output_stream::<T, _, _>(
        config,
        move |data: &mut [T], _| {
            for frame in data.chunks_mut(channels) {
                // Underrun: emit silence and keep the stream alive
                let sample = consumer.pop().unwrap_or(0.0);
                let converted = T::from_sample(sample);
                for slot in frame {
                    *slot = converted;
                }
            }
        },
        |err| tracing::warn!("output stream error: {err}"),
        None,
    )?;
    Ok(stream)
}
