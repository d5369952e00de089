//! Device selection by role.
//!
//! The typical setup routes the processed voice into a virtual cable whose
//! other end feeds a chat application, so the output we want is rarely the
//! system default. Matching is by case-insensitive name substring: an
//! explicit name wins, then the role hints, then the host default.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::io::StreamError;

const INPUT_ROLE_HINTS: &[&str] = &["mic", "input"];
const OUTPUT_ROLE_HINTS: &[&str] = &["cable input", "vb-audio"];

fn name_matches(device: &cpal::Device, query: &str) -> bool {
    device
        .name()
        .map(|name| name.to_lowercase().contains(&query.to_lowercase()))
        .unwrap_or(false)
}

/// Pick the capture device: explicit name, then a microphone-looking name,
/// then the host default.
pub fn input_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, StreamError> {
    if let Some(query) = name {
        if let Some(device) = host.input_devices()?.find(|d| name_matches(d, query)) {
            return Ok(device);
        }
    }
    for hint in INPUT_ROLE_HINTS {
        if let Some(device) = host.input_devices()?.find(|d| name_matches(d, hint)) {
            return Ok(device);
        }
    }
    host.default_input_device().ok_or(StreamError::NoInputDevice)
}

/// Pick the playback device: explicit name, then a virtual-cable-looking
/// name, then the host default.
pub fn output_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, StreamError> {
    if let Some(query) = name {
        if let Some(device) = host.output_devices()?.find(|d| name_matches(d, query)) {
            return Ok(device);
        }
    }
    for hint in OUTPUT_ROLE_HINTS {
        if let Some(device) = host.output_devices()?.find(|d| name_matches(d, hint)) {
            return Ok(device);
        }
    }
    host.default_output_device()
        .ok_or(StreamError::NoOutputDevice)
}

/// Human-readable listing of every device, for the CLI `devices` command.
pub fn describe_all(host: &cpal::Host) -> Result<Vec<String>, StreamError> {
    let mut lines = Vec::new();
    for device in host.input_devices()? {
        let name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        lines.push(format!("in : {name}"));
    }
    for device in host.output_devices()? {
        let name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        lines.push(format!("out: {name}"));
    }
    Ok(lines)
}
