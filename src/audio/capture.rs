use crate::config::AudioConfig;
use crate::error::{MeterError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::AudioBufferWriter;

/// Live input stream from the default capture device
///
/// Each callback's interleaved data is split into a [`super::SampleBlock`]
/// and handed to the writer. The stream stops when this is dropped.
pub struct AudioCapture {
    stream: cpal::Stream,
}

impl AudioCapture {
    pub fn new(config: &AudioConfig, writer: AudioBufferWriter) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| MeterError::AudioDevice("No input device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Input device: {:?}", desc),
            Err(_) => log::info!("Input device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size as u32),
        };
        let channel_count = config.channels as usize;

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    writer.push_interleaved(data, channel_count);
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| MeterError::AudioStream(format!("{}", e)))?;

        stream
            .play()
            .map_err(|e| MeterError::AudioStream(format!("{}", e)))?;

        log::info!(
            "Capturing {} channel(s) at {} Hz, {} frame buffers",
            config.channels,
            config.sample_rate,
            config.buffer_size
        );

        Ok(Self { stream })
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}
