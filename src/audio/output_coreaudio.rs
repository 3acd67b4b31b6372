//! CoreAudio-based audio output for macOS
//!
//! Native macOS audio output for lowest latency and best integration.

#[cfg(all(target_os = "macos", feature = "audio-coreaudio"))]
mod implementation {
    use std::time::Duration;

    use super::super::output::{
        AudioCallback, AudioDevice, AudioOutput, AudioOutputError, OutputState,
    };
    use crate::audio::format::{AudioFormat, SampleRate};

    // Note: This is a skeleton. Full implementation would use coreaudio-rs crate.

    /// CoreAudio output implementation
    pub struct CoreAudioOutput {
        state: OutputState,
        volume: f32,
        format: Option<AudioFormat>,
        // Would contain AudioUnit, etc.
    }

    impl CoreAudioOutput {
        /// Create a new CoreAudio output
        ///
        /// # Errors
        ///
        /// Returns `AudioOutputError` if the output cannot be initialized.
        pub fn new() -> Result<Self, AudioOutputError> {
            Ok(Self {
                state: OutputState::Stopped,
                volume: 1.0,
                format: None,
            })
        }
    }

    impl AudioOutput for CoreAudioOutput {
        fn enumerate_devices(&self) -> Result<Vec<AudioDevice>, AudioOutputError> {
            // Use AudioObjectGetPropertyData to enumerate devices
            Ok(vec![AudioDevice {
                id: "default".to_string(),
                name: "Default Output".to_string(),
                is_default: true,
                supported_rates: vec![SampleRate::Hz44100, SampleRate::Hz48000],
                supported_channels: vec![2],
            }])
        }

        fn default_device(&self) -> Result<AudioDevice, AudioOutputError> {
            Ok(AudioDevice {
                id: "default".to_string(),
                name: "Default Output".to_string(),
                is_default: true,
                supported_rates: vec![SampleRate::Hz44100, SampleRate::Hz48000],
                supported_channels: vec![2],
            })
        }

        fn open(
            &mut self,
            _device: Option<&str>,
            format: AudioFormat,
        ) -> Result<(), AudioOutputError> {
            self.format = Some(format);
            // Would configure AudioUnit here
            Ok(())
        }

        fn start(&mut self, _callback: AudioCallback) -> Result<(), AudioOutputError> {
            // Would start AudioUnit
            self.state = OutputState::Playing;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), AudioOutputError> {
            self.state = OutputState::Stopped;
            Ok(())
        }

        fn pause(&mut self) -> Result<(), AudioOutputError> {
            self.state = OutputState::Paused;
            Ok(())
        }

        fn resume(&mut self) -> Result<(), AudioOutputError> {
            self.state = OutputState::Playing;
            Ok(())
        }

        fn state(&self) -> OutputState {
            self.state
        }

        fn set_volume(&mut self, volume: f32) -> Result<(), AudioOutputError> {
            self.volume = volume.clamp(0.0, 1.0);
            Ok(())
        }

        fn volume(&self) -> f32 {
            self.volume
        }

        fn latency(&self) -> Duration {
            // CoreAudio typically has very low latency
            Duration::from_millis(10)
        }

        fn format(&self) -> Option<AudioFormat> {
            self.format
        }

        fn close(&mut self) -> Result<(), AudioOutputError> {
            self.stop()
        }
    }
}

#[cfg(all(target_os = "macos", feature = "audio-coreaudio"))]
pub use implementation::CoreAudioOutput;
