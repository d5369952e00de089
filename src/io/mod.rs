//! External interfaces: audio device selection and the duplex stream.
//!
//! Everything in here runs outside the realtime context except the two
//! closures built in [`stream`], which follow the same rules as the engine:
//! no locks, no allocation, no I/O.

pub mod devices;
pub mod stream;

use thiserror::Error;

pub use stream::{start, StreamSettings, VoiceStream};

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("no input device matches the requested role")]
    NoInputDevice,
    #[error("no output device matches the requested role")]
    NoOutputDevice,
    #[error("unsupported sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
    #[error(transparent)]
    Devices(#[from] cpal::DevicesError),
    #[error(transparent)]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error(transparent)]
    Build(#[from] cpal::BuildStreamError),
    #[error(transparent)]
    Play(#[from] cpal::PlayStreamError),
}
