//! voicepulse - realtime voice transformation from the terminal
//!
//! Run with: cargo run
//!
//! Captures the default (or named) microphone, processes it through the
//! effect chain and plays the result on the output device - typically a
//! virtual cable feeding a chat application. The prompt is the control
//! surface: it only ever issues validated parameter updates, the audio
//! thread applies them at block boundaries.

mod commands;

use std::io::{BufRead, Write};

use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::{fmt, EnvFilter};

use voicepulse::control::{param_channel, DEFAULT_QUEUE_CAPACITY};
use voicepulse::io::{self, StreamSettings};
use voicepulse::preset::PRESETS;

use commands::Command;

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = StreamSettings {
        input_name: std::env::var("VOICEPULSE_INPUT").ok(),
        output_name: std::env::var("VOICEPULSE_OUTPUT").ok(),
        sample_rate: None,
        block_size: Some(1_024),
    };

    let (mut sender, receiver) = param_channel(48_000.0, DEFAULT_QUEUE_CAPACITY);
    let stream = io::start(&settings, receiver).wrap_err("failed to start the audio stream")?;
    sender.set_sample_rate(stream.sample_rate as f32);

    println!("=== VoicePulse ===");
    println!("Input:  {}", stream.input_name);
    println!("Output: {}", stream.output_name);
    println!("Sample rate: {} Hz", stream.sample_rate);
    println!();
    print_help();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;

        match commands::parse(&line) {
            Command::Quit => break,
            Command::Empty => {}
            Command::Help => print_help(),
            Command::Bypass => {
                let bypassed = sender.toggle_bypass();
                println!("bypass: {}", if bypassed { "on" } else { "off" });
            }
            Command::Pitch(semitones) => match sender.set_pitch(semitones) {
                Ok(()) => println!("pitch: {semitones:+} semitones"),
                Err(err) => println!("rejected: {err}"),
            },
            Command::Gain(multiplier) => match sender.set_master_gain(multiplier) {
                Ok(()) => println!("master gain: {multiplier}x"),
                Err(err) => println!("rejected: {err}"),
            },
            Command::Status => {
                let status = sender.status();
                println!(
                    "bypass: {} | pitch: {:+} st | gain: {}x | preset: {}",
                    if status.bypass { "on" } else { "off" },
                    status.pitch_semitones,
                    status.master_gain,
                    status.preset,
                );
            }
            Command::Devices => match io::devices::describe_all(&cpal::default_host()) {
                Ok(lines) => lines.iter().for_each(|line| println!("{line}")),
                Err(err) => println!("device listing failed: {err}"),
            },
            Command::Presets => {
                for preset in PRESETS {
                    println!("{}", preset.name);
                }
            }
            Command::Preset(name) => match sender.apply_preset(&name) {
                Ok(()) => println!("applied preset: {name}"),
                Err(err) => println!("rejected: {err}"),
            },
            Command::Unknown(input) => {
                println!("unknown command `{input}` (try `help`)");
            }
        }
    }

    println!("engine shutdown");
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  p <semitones>   pitch shift, -12 to 12");
    println!("  g <multiplier>  master gain, 0 to 8");
    println!("  b               toggle bypass");
    println!("  s               status");
    println!("  presets         list presets");
    println!("  devices         list audio devices");
    println!("  <preset name>   apply a preset (deep, chipmunk, robot, ...)");
    println!("  q               quit");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
